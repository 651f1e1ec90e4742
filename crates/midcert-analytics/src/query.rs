// SPDX-License-Identifier: Apache-2.0

use rusqlite::{Connection, Params};
use serde::Serialize;

use crate::AnalyticsError;

/// One row of a grouped breakdown: group key, row count and the measured value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub count: i64,
    pub value: f64,
}

/// Runs `sql`, which must select `(key, count, value)`.
pub(crate) fn group_stats(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> Result<Vec<GroupStat>, AnalyticsError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(GroupStat {
            key: row.get(0)?,
            count: row.get(1)?,
            value: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round1(56.75), 56.8);
        assert_eq!(round1(12.34), 12.3);
        assert_eq!(round1(0.0), 0.0);
    }
}
