// SPDX-License-Identifier: Apache-2.0

use midcert_core::{ExitCode, MachineError, ResultExt};

#[test]
fn result_ext_attaches_static_context() {
    let r: Result<(), &str> = Err("bad");
    let err = r.with_context("read clients.csv").expect_err("must error");
    assert_eq!(err.context, "read clients.csv");
    assert_eq!(err.source, "bad");
    assert_eq!(err.to_string(), "read clients.csv: bad");
}

#[test]
fn machine_error_serializes_with_sorted_details() {
    let err = MachineError::new("validation_failed", "2 critical checks")
        .with_detail("z", "1")
        .with_detail("a", "2");
    let raw = serde_json::to_string(&err).expect("json");
    assert_eq!(
        raw,
        r#"{"code":"validation_failed","message":"2 critical checks","details":{"a":"2","z":"1"}}"#
    );
}

#[test]
fn exit_codes_are_stable() {
    assert_eq!(ExitCode::Success as u8, 0);
    assert_eq!(ExitCode::Usage as u8, 2);
    assert_eq!(ExitCode::Validation as u8, 3);
    assert_eq!(ExitCode::DependencyFailure as u8, 4);
    assert_eq!(ExitCode::Internal as u8, 10);
    assert_eq!(ExitCode::Validation.as_str(), "validation");
}
