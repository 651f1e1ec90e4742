// SPDX-License-Identifier: Apache-2.0

use midcert_core::{canonical, ResultExt};
use serde::Serialize;
use serde_json::Value;

use crate::{CliError, OutputMode};

/// One command's result: a machine payload and its human rendering.
pub(crate) struct CommandOutput {
    pub(crate) payload: Value,
    pub(crate) text: String,
}

impl CommandOutput {
    pub(crate) fn new(command: &str, payload: Value, text: String) -> Self {
        let payload = match payload {
            Value::Object(mut map) => {
                map.insert("command".to_string(), Value::String(command.to_string()));
                Value::Object(map)
            }
            other => serde_json::json!({ "command": command, "result": other }),
        };
        Self { payload, text }
    }
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value, CliError> {
    serde_json::to_value(value)
        .with_context("encode command output")
        .map_err(|e| CliError::internal(e.to_string()))
}

pub(crate) fn emit_ok(output_mode: OutputMode, output: &CommandOutput) -> Result<(), CliError> {
    if output_mode.json {
        let bytes = canonical::stable_json_bytes(&output.payload)
            .with_context("encode json output")
            .map_err(|e| CliError::internal(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| CliError::internal(e.to_string()))?;
        println!("{text}");
    } else {
        print!("{}", output.text);
        if !output.text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
