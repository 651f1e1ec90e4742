// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use midcert_core::{resolve_config_path, resolve_data_dir, ConfigPathScope};

#[test]
fn explicit_data_dir_wins() {
    let explicit = PathBuf::from("/tmp/explicit-midcert");
    assert_eq!(resolve_data_dir(Some(explicit.clone())), explicit);
}

#[test]
fn workspace_config_path_is_relative() {
    if std::env::var("MIDCERT_CONFIG").is_ok() {
        return;
    }
    let path = resolve_config_path(ConfigPathScope::Workspace);
    assert!(path.is_relative());
    assert!(path.ends_with("generator.json"));
}
