// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ValidationError;

/// Closed categorical domain whose CSV spelling is the label.
macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            pub fn parse(raw: &str) -> Result<Self, ValidationError> {
                match raw {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(ValidationError(format!("invalid {} `{}`", $kind, raw))),
                }
            }

            #[must_use]
            pub fn is_valid_label(raw: &str) -> bool {
                Self::parse(raw).is_ok()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, ValidationError> {
                Self::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(|e| serde::de::Error::custom(e.0))
            }
        }
    };
}

category!(
    ManufacturerSize, "manufacturer_size" {
        Sme => "SME",
        Large => "Large",
    }
);

category!(
    Sector, "sector" {
        Energy => "Energy",
        Utilities => "Utilities",
        RetailFuel => "Retail Fuel",
        Transportation => "Transportation",
        MultiSector => "Multi-sector",
    }
);

category!(
    InstrumentType, "instrument_type" {
        GasMeter => "Gas Meter",
        ElectricityMeter => "Electricity Meter",
        WaterMeter => "Water Meter",
        Dispenser => "Dispenser",
        Taximeter => "Taximeter",
    }
);

category!(
    /// MID conformity assessment module: B is type examination, D is
    /// production quality assurance.
    MidModule, "mid_module" {
        B => "B",
        D => "D",
    }
);

category!(
    RiskClass, "risk_class" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
);

category!(
    AuditStatus, "audit_status" {
        Pass => "PASS",
        Fail => "FAIL",
        Pending => "PENDING",
    }
);

category!(
    /// Documented reason of a failed audit. Module B reasons concern the
    /// technical file, Module D reasons the quality management system.
    FailureReason, "failure_reason" {
        TechnicalFileIncomplete => "Technical file incomplete",
        DocumentationInconsistencies => "Documentation inconsistencies",
        TestReportGaps => "Test report gaps",
        MetrologicalRequirementsUnclear => "Metrological requirements unclear",
        SoftwareDocumentationMissing => "Software documentation missing",
        DurabilityEvidenceInsufficient => "Durability evidence insufficient",
        MarkingNonCompliant => "Marking/labelling non-compliant",
        EmcTestResultsMissing => "EMC test results missing",
        TrainingRecordsMissing => "Training records missing",
        InternalAuditGaps => "Internal audit gaps",
        CalibrationRecordsOutdated => "Calibration records outdated",
        NonConformanceHandlingUnclear => "Non-conformance handling unclear",
        ProductionProcessNotDocumented => "Production process not documented",
        SupplierControlInsufficient => "Supplier control insufficient",
        ManagementReviewIncomplete => "Management review incomplete",
        CorrectiveActionRecordsMissing => "Corrective action records missing",
    }
);

impl FailureReason {
    #[must_use]
    pub const fn module(self) -> MidModule {
        match self {
            Self::TechnicalFileIncomplete
            | Self::DocumentationInconsistencies
            | Self::TestReportGaps
            | Self::MetrologicalRequirementsUnclear
            | Self::SoftwareDocumentationMissing
            | Self::DurabilityEvidenceInsufficient
            | Self::MarkingNonCompliant
            | Self::EmcTestResultsMissing => MidModule::B,
            Self::TrainingRecordsMissing
            | Self::InternalAuditGaps
            | Self::CalibrationRecordsOutdated
            | Self::NonConformanceHandlingUnclear
            | Self::ProductionProcessNotDocumented
            | Self::SupplierControlInsufficient
            | Self::ManagementReviewIncomplete
            | Self::CorrectiveActionRecordsMissing => MidModule::D,
        }
    }

    pub fn for_module(module: MidModule) -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied().filter(move |r| r.module() == module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_parse() {
        for sector in Sector::ALL {
            assert_eq!(Sector::parse(sector.as_str()).expect("sector"), *sector);
        }
        for reason in FailureReason::ALL {
            assert_eq!(FailureReason::parse(reason.as_str()).expect("reason"), *reason);
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!(AuditStatus::parse("pass").is_err());
        assert!(MidModule::parse("b").is_err());
        assert!(ManufacturerSize::parse("SME").is_ok());
    }

    #[test]
    fn each_module_owns_eight_reasons() {
        assert_eq!(FailureReason::for_module(MidModule::B).count(), 8);
        assert_eq!(FailureReason::for_module(MidModule::D).count(), 8);
    }
}
