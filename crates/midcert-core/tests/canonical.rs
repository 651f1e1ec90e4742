// SPDX-License-Identifier: Apache-2.0

use midcert_core::{canonical, sha256_hex};
use serde_json::json;

#[test]
fn stable_json_bytes_are_key_order_deterministic() {
    let a = json!({"z": 2, "a": 1});
    let b = json!({"a": 1, "z": 2});
    let ba = canonical::stable_json_bytes(&a).expect("stable json a");
    let bb = canonical::stable_json_bytes(&b).expect("stable json b");
    assert_eq!(ba, bb);
}

#[test]
fn sha256_is_repeatable_for_same_bytes() {
    let bytes = b"midcert-core-determinism";
    assert_eq!(sha256_hex(bytes), sha256_hex(bytes));
}

#[test]
fn nested_objects_hash_identically_regardless_of_key_order() {
    let a = json!({"k2": 2, "k1": 1, "nested": {"b": 2, "a": 1}});
    let b = json!({"nested": {"a": 1, "b": 2}, "k1": 1, "k2": 2});
    let ba = canonical::stable_json_bytes(&a).expect("stable json a");
    let bb = canonical::stable_json_bytes(&b).expect("stable json b");
    assert_eq!(sha256_hex(&ba), sha256_hex(&bb));
}
