//! Reviewable documents: the shared register behind every QHSE and STS form.
//!
//! A document kind only contributes catalog data (form-code prefix, upload limits, closing
//! status); creation, review, re-upload, and download follow one workflow.

pub mod catalog;
pub mod domain;
pub mod form_code;
pub mod repository;
pub mod revision;
pub mod router;
pub mod service;
pub mod status;
pub mod storage;
pub mod upload;

#[cfg(test)]
mod tests;

pub use catalog::{catalog, DocumentKind, KindSpec, KindView, SequenceScope};
pub use domain::{
    Attachment, Attribution, DocumentId, DocumentPatch, DocumentRecord, DocumentView,
    NewDocument, RevisionRequest, StatusRequest,
};
pub use form_code::{FormCode, SequenceKey};
pub use repository::{DocumentFilter, DocumentRepository, ListQuery, RepositoryError};
pub use revision::{Revision, RevisionParseError};
pub use router::document_router;
pub use service::{DocumentService, DocumentServiceError, WorkflowSettings};
pub use status::{ApprovalStatus, TransitionError, TransitionPolicy};
pub use storage::{InMemoryObjectStore, LocalDiskObjectStore, ObjectStore, StorageError};
pub use upload::{FileUpload, UploadError, UploadPolicy};
