use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::DocumentKind;
use super::form_code::FormCode;
use super::revision::Revision;
use super::status::{ApprovalStatus, TransitionPolicy};

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

/// Identifier wrapper for stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text identity of whoever uploaded or reviewed a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Attribution {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: None,
        }
    }
}

/// Stored file reference. `section` distinguishes per-quarter or per-row files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub storage_key: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// One revision of a reviewable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub form_code: FormCode,
    pub revision: Revision,
    pub year: i32,
    pub title: String,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub uploaded_by: Attribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Attribution>,
    pub attachments: Vec<Attachment>,
    pub details: Map<String, Value>,
    pub effective_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub planned_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub supersedes: Option<DocumentId>,
    pub superseded_by: Option<DocumentId>,
}

impl DocumentRecord {
    /// True for the latest revision of a document.
    pub fn is_current(&self) -> bool {
        self.superseded_by.is_none()
    }

    pub fn attachment(&self, section: Option<&str>) -> Option<&Attachment> {
        match section {
            Some(section) => self
                .attachments
                .iter()
                .find(|attachment| attachment.section.as_deref() == Some(section)),
            None => self
                .attachments
                .iter()
                .find(|attachment| attachment.section.is_none())
                .or_else(|| self.attachments.first()),
        }
    }

    pub fn view(&self, policy: TransitionPolicy) -> DocumentView {
        let allowed_transitions = if self.is_current() {
            policy.successors(self.kind, self.status)
        } else {
            Vec::new()
        };

        DocumentView {
            record: self.clone(),
            status_label: self.status.label(),
            is_current: self.is_current(),
            allowed_transitions,
        }
    }
}

/// Record as returned by the HTTP layer, with the actions a reviewer may take next.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub record: DocumentRecord,
    pub status_label: &'static str,
    pub is_current: bool,
    pub allowed_transitions: Vec<ApprovalStatus>,
}

/// Metadata accompanying a new document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub year: i32,
    pub title: String,
    pub uploaded_by: Attribution,
    #[serde(default)]
    pub as_draft: bool,
    #[serde(default)]
    pub details: Map<String, Value>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,
}

/// Partial metadata update. Absent fields are left unchanged; `details` keys are merged and a
/// `null` value removes the key. Dates sent as `null` are cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<Map<String, Value>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub planned_date: Option<Option<NaiveDate>>,
}

/// Wrap a field that appeared in the payload, `null` included, so it differs from an absent one.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Reviewer action on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: ApprovalStatus,
    #[serde(default)]
    pub reviewed_by: Option<Attribution>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Metadata accompanying a re-upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRequest {
    pub uploaded_by: Attribution,
    /// Optimistic lock: the revision the client last saw.
    #[serde(default)]
    pub expected_revision: Option<Revision>,
}

pub(crate) fn validate_year(year: i32) -> Result<(), String> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(format!("year {year} is outside {MIN_YEAR}..={MAX_YEAR}"))
    }
}

pub(crate) fn validate_attribution(role: &str, attribution: &Attribution) -> Result<(), String> {
    if attribution.name.trim().is_empty() {
        Err(format!("{role} name is required"))
    } else {
        Ok(())
    }
}
