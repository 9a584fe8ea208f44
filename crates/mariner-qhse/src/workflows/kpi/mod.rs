//! Yearly QHSE key performance indicator sheets.

pub mod domain;
pub mod repository;
mod router;
mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Aggregation, Indicator, KpiEntry, KpiEntryView, KpiSheet, KpiSheetView, QuarterValue,
    SeedRequest,
};
pub use repository::{KpiRepository, KpiRepositoryError};
pub use router::kpi_router;
pub use service::{KpiError, KpiService};
