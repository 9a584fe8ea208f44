use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard QHSE indicator set seeded into every yearly sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Indicator {
    Ltif,
    Trcf,
    NearMissReports,
    DrillsCompleted,
    AuditFindingsClosed,
    OilSpills,
    PscDeficiencies,
}

/// How quarterly actuals roll up into the annual figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Average,
}

impl Indicator {
    pub const ALL: [Indicator; 7] = [
        Indicator::Ltif,
        Indicator::Trcf,
        Indicator::NearMissReports,
        Indicator::DrillsCompleted,
        Indicator::AuditFindingsClosed,
        Indicator::OilSpills,
        Indicator::PscDeficiencies,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Indicator::Ltif => "ltif",
            Indicator::Trcf => "trcf",
            Indicator::NearMissReports => "near-miss-reports",
            Indicator::DrillsCompleted => "drills-completed",
            Indicator::AuditFindingsClosed => "audit-findings-closed",
            Indicator::OilSpills => "oil-spills",
            Indicator::PscDeficiencies => "psc-deficiencies",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Indicator::Ltif => "Lost time injury frequency",
            Indicator::Trcf => "Total recordable case frequency",
            Indicator::NearMissReports => "Near-miss reports",
            Indicator::DrillsCompleted => "Drills completed",
            Indicator::AuditFindingsClosed => "Audit findings closed",
            Indicator::OilSpills => "Oil spills to sea",
            Indicator::PscDeficiencies => "PSC deficiencies",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Indicator::Ltif | Indicator::Trcf => "per million exposure hours",
            Indicator::AuditFindingsClosed => "percent",
            _ => "count",
        }
    }

    pub const fn aggregation(self) -> Aggregation {
        match self {
            Indicator::Ltif | Indicator::Trcf | Indicator::AuditFindingsClosed => {
                Aggregation::Average
            }
            _ => Aggregation::Sum,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|indicator| indicator.code().eq_ignore_ascii_case(code))
    }
}

/// One indicator row of a yearly sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiEntry {
    pub indicator: Indicator,
    pub label: String,
    pub unit: String,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub target: Option<f64>,
    pub quarters: [Option<f64>; 4],
}

impl KpiEntry {
    pub fn seeded(indicator: Indicator, target: Option<f64>) -> Self {
        Self {
            indicator,
            label: indicator.label().to_string(),
            unit: indicator.unit().to_string(),
            aggregation: indicator.aggregation(),
            target,
            quarters: [None; 4],
        }
    }

    /// Roll-up of the recorded quarters, or `None` before any actual is in.
    pub fn annual(&self) -> Option<f64> {
        let recorded: Vec<f64> = self.quarters.iter().flatten().copied().collect();
        if recorded.is_empty() {
            return None;
        }
        let total: f64 = recorded.iter().sum();
        Some(match self.aggregation {
            Aggregation::Sum => total,
            Aggregation::Average => total / recorded.len() as f64,
        })
    }
}

/// Per-year KPI register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSheet {
    pub year: i32,
    pub entries: Vec<KpiEntry>,
    pub seeded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KpiSheet {
    pub fn entry(&self, indicator: Indicator) -> Option<&KpiEntry> {
        self.entries
            .iter()
            .find(|entry| entry.indicator == indicator)
    }

    pub fn view(&self) -> KpiSheetView {
        KpiSheetView {
            year: self.year,
            seeded_at: self.seeded_at,
            updated_at: self.updated_at,
            entries: self
                .entries
                .iter()
                .map(|entry| KpiEntryView {
                    entry: entry.clone(),
                    annual: entry.annual(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiSheetView {
    pub year: i32,
    pub seeded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub entries: Vec<KpiEntryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiEntryView {
    #[serde(flatten)]
    pub entry: KpiEntry,
    pub annual: Option<f64>,
}

/// Optional targets keyed by indicator, applied when a year is seeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedRequest {
    #[serde(default)]
    pub targets: std::collections::BTreeMap<Indicator, f64>,
}

/// Body of a quarterly actual update; `null` clears the quarter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterValue {
    #[serde(default)]
    pub value: Option<f64>,
}
