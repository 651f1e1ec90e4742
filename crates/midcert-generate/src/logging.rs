// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateStage {
    Prepare,
    Sample,
    Persist,
    Finalize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateEvent {
    pub stage: GenerateStage,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone)]
pub struct GenerateLog {
    events: Vec<GenerateEvent>,
}

impl GenerateLog {
    pub fn emit(
        &mut self,
        stage: GenerateStage,
        name: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) {
        let name = name.into();
        tracing::debug!(stage = ?stage, event = %name, "generate stage");
        self.events.push(GenerateEvent {
            stage,
            name,
            fields,
        });
    }

    #[must_use]
    pub fn into_events(self) -> Vec<GenerateEvent> {
        self.events
    }
}

pub(crate) fn fields<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
