// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod canonical;
mod config;
mod errors;

pub use canonical::sha256_hex;
pub use config::{
    resolve_config_path, resolve_data_dir, resolve_log_level, ConfigPathScope,
    DEFAULT_DATA_DIR,
};
pub use errors::{ErrorContext, ExitCode, MachineError, ResultExt};

pub const CRATE_NAME: &str = "midcert-core";

pub const ENV_MIDCERT_DATA_DIR: &str = "MIDCERT_DATA_DIR";
pub const ENV_MIDCERT_LOG_LEVEL: &str = "MIDCERT_LOG_LEVEL";
pub const ENV_MIDCERT_LOG_JSON: &str = "MIDCERT_LOG_JSON";
pub const ENV_MIDCERT_CONFIG: &str = "MIDCERT_CONFIG";
