// SPDX-License-Identifier: Apache-2.0

use midcert_generate::{generate_dataset, GeneratorConfig};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(32))]
    #[test]
    fn small_batches_keep_dates_ordered_and_references_closed(
        seed in any::<u64>(),
        applications in 1_u32..80,
        clients in 1_u32..12,
    ) {
        let config = GeneratorConfig { seed, applications, clients, ..GeneratorConfig::default() };
        let dataset = generate_dataset(&config).expect("generate");
        prop_assert_eq!(dataset.applications.len(), applications as usize);
        prop_assert_eq!(
            dataset.audit_results.len() as u32,
            dataset.certification_results.iter().map(|r| r.total_revisions + 1).sum::<u32>()
        );
        for (app, result) in dataset.applications.iter().zip(&dataset.certification_results) {
            prop_assert!(dataset.clients.iter().any(|c| c.client_id == app.client_id));
            prop_assert!(app.submission_date >= config.period_start);
            prop_assert!(app.submission_date <= config.period_end);
            if let Some(days) = result.turnaround_days(app.submission_date) {
                prop_assert!((20..=111).contains(&days), "turnaround {}", days);
            }
        }
        for audit in &dataset.audit_results {
            let app = dataset.application(&audit.application_id).expect("audit parent");
            prop_assert!(audit.audit_date >= app.submission_date);
        }
    }

    #[test]
    fn generation_is_a_pure_function_of_the_config(seed in any::<u64>()) {
        let config = GeneratorConfig { seed, applications: 40, clients: 5, ..GeneratorConfig::default() };
        prop_assert_eq!(
            generate_dataset(&config).expect("first"),
            generate_dataset(&config).expect("second")
        );
    }
}
