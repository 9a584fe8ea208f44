use super::domain::KpiSheet;

/// Persistence for yearly KPI sheets. One sheet per year.
pub trait KpiRepository: Send + Sync {
    /// Store a new sheet; `Conflict` when the year already has one.
    fn insert(&self, sheet: KpiSheet) -> Result<KpiSheet, KpiRepositoryError>;
    fn update(&self, sheet: KpiSheet) -> Result<(), KpiRepositoryError>;
    fn fetch(&self, year: i32) -> Result<Option<KpiSheet>, KpiRepositoryError>;
    fn years(&self) -> Result<Vec<i32>, KpiRepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KpiRepositoryError {
    #[error("sheet already exists")]
    Conflict,
    #[error("sheet not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
