use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::{DocumentKind, SequenceScope};

/// Human-readable document number such as `DP-2025-007` or `VA-0042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormCode(pub String);

impl FormCode {
    pub fn compose(kind: DocumentKind, year: i32, sequence: u32) -> Self {
        let spec = kind.spec();
        let code = match spec.sequence_scope {
            SequenceScope::PerYear => format!("{}-{year}-{sequence:03}", spec.prefix),
            SequenceScope::Global => format!("{}-{sequence:04}", spec.prefix),
        };
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counter a repository increments when allocating form codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceKey {
    pub kind: DocumentKind,
    pub year: Option<i32>,
}

impl SequenceKey {
    pub fn for_document(kind: DocumentKind, year: i32) -> Self {
        let year = match kind.spec().sequence_scope {
            SequenceScope::PerYear => Some(year),
            SequenceScope::Global => None,
        };
        Self { kind, year }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_year_kinds_embed_the_year() {
        let code = FormCode::compose(DocumentKind::DrillPlan, 2025, 7);
        assert_eq!(code.as_str(), "DP-2025-007");
        assert_eq!(
            SequenceKey::for_document(DocumentKind::DrillPlan, 2025).year,
            Some(2025)
        );
    }

    #[test]
    fn global_kinds_share_one_sequence() {
        let code = FormCode::compose(DocumentKind::VendorApproval, 2025, 42);
        assert_eq!(code.to_string(), "VA-0042");
        assert_eq!(
            SequenceKey::for_document(DocumentKind::VendorApproval, 2024),
            SequenceKey::for_document(DocumentKind::VendorApproval, 2025)
        );
    }

    #[test]
    fn sequences_wider_than_the_padding_are_kept_whole() {
        let code = FormCode::compose(DocumentKind::NearMissReport, 2024, 1234);
        assert_eq!(code.as_str(), "NM-2024-1234");
    }
}
