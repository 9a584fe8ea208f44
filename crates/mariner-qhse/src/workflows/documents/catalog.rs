use serde::{Deserialize, Serialize};

use super::status::ApprovalStatus;
use super::upload::UploadPolicy;

const MEGABYTE: u64 = 1024 * 1024;

const OFFICE_DOCUMENTS: &[&str] = &["pdf", "doc", "docx"];
const OFFICE_WITH_SHEETS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx"];
const OFFICE_WITH_IMAGES: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];
const PDF_AND_IMAGES: &[&str] = &["pdf", "jpg", "jpeg", "png"];
const SPREADSHEETS: &[&str] = &["pdf", "xls", "xlsx", "csv"];
const PRESENTATIONS: &[&str] = &["pdf", "doc", "docx", "ppt", "pptx"];

/// Every document type managed by the QHSE and STS registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    DrillPlan,
    InternalAudit,
    VendorApproval,
    NearMissReport,
    KpiReport,
    RiskAssessment,
    ManagementReview,
    TrainingRecord,
    CrossCompetency,
    StsProcedure,
}

/// Whether form-code sequences restart every calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceScope {
    PerYear,
    Global,
}

/// Static rules attached to a document kind.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KindSpec {
    pub prefix: &'static str,
    pub sequence_scope: SequenceScope,
    pub allows_draft: bool,
    pub allows_resubmission: bool,
    /// Closing status reviewers record: audits and reports are "reviewed", the rest "approved".
    pub final_status: ApprovalStatus,
    pub max_upload_bytes: u64,
    pub allowed_extensions: &'static [&'static str],
}

impl KindSpec {
    pub fn initial_status(&self, as_draft: bool) -> ApprovalStatus {
        if as_draft && self.allows_draft {
            ApprovalStatus::Draft
        } else {
            ApprovalStatus::Pending
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_upload_bytes,
            allowed_extensions: self.allowed_extensions,
        }
    }
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 10] = [
        DocumentKind::DrillPlan,
        DocumentKind::InternalAudit,
        DocumentKind::VendorApproval,
        DocumentKind::NearMissReport,
        DocumentKind::KpiReport,
        DocumentKind::RiskAssessment,
        DocumentKind::ManagementReview,
        DocumentKind::TrainingRecord,
        DocumentKind::CrossCompetency,
        DocumentKind::StsProcedure,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::DrillPlan => "Drill plan",
            DocumentKind::InternalAudit => "Internal audit",
            DocumentKind::VendorApproval => "Vendor approval",
            DocumentKind::NearMissReport => "Near-miss report",
            DocumentKind::KpiReport => "KPI report",
            DocumentKind::RiskAssessment => "Risk assessment",
            DocumentKind::ManagementReview => "Management review",
            DocumentKind::TrainingRecord => "Training record",
            DocumentKind::CrossCompetency => "Cross-competency assessment",
            DocumentKind::StsProcedure => "STS operating procedure",
        }
    }

    /// Path-safe identifier matching the serialized form.
    pub const fn slug(self) -> &'static str {
        match self {
            DocumentKind::DrillPlan => "drill-plan",
            DocumentKind::InternalAudit => "internal-audit",
            DocumentKind::VendorApproval => "vendor-approval",
            DocumentKind::NearMissReport => "near-miss-report",
            DocumentKind::KpiReport => "kpi-report",
            DocumentKind::RiskAssessment => "risk-assessment",
            DocumentKind::ManagementReview => "management-review",
            DocumentKind::TrainingRecord => "training-record",
            DocumentKind::CrossCompetency => "cross-competency",
            DocumentKind::StsProcedure => "sts-procedure",
        }
    }

    pub const fn spec(self) -> KindSpec {
        use ApprovalStatus::{Approved, Reviewed};
        use SequenceScope::{Global, PerYear};

        let (prefix, sequence_scope, allows_draft, allows_resubmission, final_status) = match self
        {
            DocumentKind::DrillPlan => ("DP", PerYear, true, true, Approved),
            DocumentKind::InternalAudit => ("IA", PerYear, true, true, Reviewed),
            DocumentKind::VendorApproval => ("VA", Global, false, true, Approved),
            DocumentKind::NearMissReport => ("NM", PerYear, false, false, Reviewed),
            DocumentKind::KpiReport => ("KPI", PerYear, false, true, Approved),
            DocumentKind::RiskAssessment => ("RA", Global, true, true, Approved),
            DocumentKind::ManagementReview => ("MR", PerYear, true, false, Reviewed),
            DocumentKind::TrainingRecord => ("TR", PerYear, false, true, Approved),
            DocumentKind::CrossCompetency => ("CC", Global, true, true, Approved),
            DocumentKind::StsProcedure => ("SOP", Global, true, true, Approved),
        };

        let (max_upload_mb, allowed_extensions) = match self {
            DocumentKind::DrillPlan | DocumentKind::RiskAssessment => (25, OFFICE_WITH_SHEETS),
            DocumentKind::InternalAudit
            | DocumentKind::CrossCompetency
            | DocumentKind::StsProcedure => (25, OFFICE_DOCUMENTS),
            DocumentKind::VendorApproval => (25, OFFICE_WITH_IMAGES),
            DocumentKind::NearMissReport => (10, PDF_AND_IMAGES),
            DocumentKind::TrainingRecord => (25, PDF_AND_IMAGES),
            DocumentKind::KpiReport => (25, SPREADSHEETS),
            DocumentKind::ManagementReview => (25, PRESENTATIONS),
        };

        KindSpec {
            prefix,
            sequence_scope,
            allows_draft,
            allows_resubmission,
            final_status,
            max_upload_bytes: max_upload_mb * MEGABYTE,
            allowed_extensions,
        }
    }
}

/// Catalog entry exposed to clients so forms can render the right controls.
#[derive(Debug, Clone, Serialize)]
pub struct KindView {
    pub kind: DocumentKind,
    pub label: &'static str,
    #[serde(flatten)]
    pub spec: KindSpec,
}

pub fn catalog() -> Vec<KindView> {
    DocumentKind::ALL
        .iter()
        .map(|kind| KindView {
            kind: *kind,
            label: kind.label(),
            spec: kind.spec(),
        })
        .collect()
}
