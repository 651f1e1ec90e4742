// SPDX-License-Identifier: Apache-2.0

use midcert_model::{ApplicationId, AuditId, ClientId};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn sequence_ids_parse_back(n in 1_u32..=9_999) {
        let client = ClientId::from_sequence(n).expect("client id");
        prop_assert_eq!(ClientId::new(client.as_str()).expect("parse"), client.clone());
        prop_assert_eq!(client.as_str().len(), 7);

        let app = ApplicationId::from_sequence(n).expect("app id");
        prop_assert!(ApplicationId::is_well_formed(app.as_str()));
        let audit = AuditId::from_sequence(n).expect("audit id");
        prop_assert!(audit.as_str().starts_with("AUD"));
    }

    #[test]
    fn sequence_order_matches_lexicographic_order(a in 1_u32..=99_999, b in 1_u32..=99_999) {
        let ia = ApplicationId::from_sequence(a).expect("a");
        let ib = ApplicationId::from_sequence(b).expect("b");
        prop_assert_eq!(a.cmp(&b), ia.cmp(&ib));
    }
}
