// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::{ENV_MIDCERT_CONFIG, ENV_MIDCERT_DATA_DIR, ENV_MIDCERT_LOG_LEVEL};

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigPathScope {
    User,
    Workspace,
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Data directory precedence: explicit argument, `MIDCERT_DATA_DIR`, `./data`.
#[must_use]
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    non_empty_env(ENV_MIDCERT_DATA_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[must_use]
pub fn resolve_config_path(scope: ConfigPathScope) -> PathBuf {
    if let Some(explicit) = non_empty_env(ENV_MIDCERT_CONFIG) {
        return PathBuf::from(explicit);
    }
    match scope {
        ConfigPathScope::User => {
            if let Some(xdg_config_home) = non_empty_env("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg_config_home)
                    .join("midcert")
                    .join("generator.json");
            }
            if let Some(home) = non_empty_env("HOME") {
                return PathBuf::from(home)
                    .join(".config")
                    .join("midcert")
                    .join("generator.json");
            }
            PathBuf::from(".midcert").join("generator.json")
        }
        ConfigPathScope::Workspace => PathBuf::from(".midcert").join("generator.json"),
    }
}

#[must_use]
pub fn resolve_log_level() -> Option<String> {
    non_empty_env(ENV_MIDCERT_LOG_LEVEL)
}
