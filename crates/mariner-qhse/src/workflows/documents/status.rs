use serde::{Deserialize, Serialize};

use super::catalog::DocumentKind;

/// Review lifecycle shared by every document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Draft,
    Pending,
    UnderReview,
    Reviewed,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 6] = [
        ApprovalStatus::Draft,
        ApprovalStatus::Pending,
        ApprovalStatus::UnderReview,
        ApprovalStatus::Reviewed,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "draft",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::UnderReview => "under_review",
            ApprovalStatus::Reviewed => "reviewed",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub const fn awaits_review(self) -> bool {
        matches!(self, ApprovalStatus::Pending | ApprovalStatus::UnderReview)
    }

    /// Statuses that record a reviewer's decision.
    pub const fn is_decision(self) -> bool {
        matches!(
            self,
            ApprovalStatus::Reviewed | ApprovalStatus::Approved | ApprovalStatus::Rejected
        )
    }
}

/// How status changes are checked.
///
/// `Lenient` stores whatever status is requested, matching the behaviour of the legacy admin
/// screens. `Strict` only accepts moves listed in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Strict,
    Lenient,
}

impl TransitionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" | "legacy" => Some(Self::Lenient),
            _ => None,
        }
    }

    /// Validate a move. `Ok(false)` means the document is already in the requested status.
    pub fn check(
        self,
        kind: DocumentKind,
        from: ApprovalStatus,
        to: ApprovalStatus,
        reviewer: Option<&str>,
    ) -> Result<bool, TransitionError> {
        if from == to {
            return Ok(false);
        }
        if self == TransitionPolicy::Lenient {
            return Ok(true);
        }

        if !offered(kind, to) {
            return Err(TransitionError::NotOffered {
                kind: kind.label(),
                status: to.label(),
            });
        }

        if !allowed(kind, from, to) {
            return Err(TransitionError::NotAllowed {
                from: from.label(),
                to: to.label(),
            });
        }

        if to.is_decision() && reviewer.map_or(true, |name| name.trim().is_empty()) {
            return Err(TransitionError::ReviewerRequired(to.label()));
        }

        Ok(true)
    }

    /// Statuses a client may request next; the detail view uses this to enable actions.
    pub fn successors(self, kind: DocumentKind, from: ApprovalStatus) -> Vec<ApprovalStatus> {
        ApprovalStatus::ALL
            .into_iter()
            .filter(|to| *to != from)
            .filter(|to| match self {
                TransitionPolicy::Lenient => true,
                TransitionPolicy::Strict => offered(kind, *to) && allowed(kind, from, *to),
            })
            .collect()
    }
}

fn offered(kind: DocumentKind, status: ApprovalStatus) -> bool {
    let spec = kind.spec();
    match status {
        ApprovalStatus::Draft => spec.allows_draft,
        ApprovalStatus::Approved | ApprovalStatus::Reviewed => status == spec.final_status,
        _ => true,
    }
}

fn allowed(kind: DocumentKind, from: ApprovalStatus, to: ApprovalStatus) -> bool {
    use ApprovalStatus::*;

    let spec = kind.spec();
    match (from, to) {
        (Draft, Pending | UnderReview) => true,
        (Pending, Draft) => spec.allows_draft,
        (Pending, UnderReview | Rejected) => true,
        (UnderReview, Rejected) => true,
        (Pending | UnderReview, Approved | Reviewed) => to == spec.final_status,
        (Rejected, Pending) => spec.allows_resubmission,
        (Rejected, Draft) => spec.allows_resubmission && spec.allows_draft,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move a document from {from} to {to}")]
    NotAllowed {
        from: &'static str,
        to: &'static str,
    },
    #[error("{kind} documents do not use the {status} status")]
    NotOffered {
        kind: &'static str,
        status: &'static str,
    },
    #[error("a reviewer name is required to mark a document {0}")]
    ReviewerRequired(&'static str),
}
