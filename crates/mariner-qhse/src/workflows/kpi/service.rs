use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Indicator, KpiEntry, KpiSheet, SeedRequest};
use super::repository::{KpiRepository, KpiRepositoryError};
use crate::workflows::documents::domain::validate_year;

/// Yearly KPI register: seeding, quarterly actuals, and CSV export.
pub struct KpiService<R> {
    repository: Arc<R>,
}

impl<R> KpiService<R>
where
    R: KpiRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create the sheet for `year` with the standard indicators.
    pub fn seed(&self, year: i32, request: SeedRequest) -> Result<KpiSheet, KpiError> {
        validate_year(year).map_err(KpiError::Validation)?;
        if let Some((indicator, _)) = request
            .targets
            .iter()
            .find(|(_, target)| !target.is_finite() || **target < 0.0)
        {
            return Err(KpiError::Validation(format!(
                "target for {} must be a non-negative number",
                indicator.code()
            )));
        }

        let now = Utc::now();
        let sheet = KpiSheet {
            year,
            entries: Indicator::ALL
                .into_iter()
                .map(|indicator| {
                    KpiEntry::seeded(indicator, request.targets.get(&indicator).copied())
                })
                .collect(),
            seeded_at: now,
            updated_at: now,
        };

        match self.repository.insert(sheet) {
            Ok(sheet) => {
                info!(year, indicators = sheet.entries.len(), "kpi sheet seeded");
                Ok(sheet)
            }
            Err(KpiRepositoryError::Conflict) => Err(KpiError::AlreadySeeded(year)),
            Err(err) => Err(err.into()),
        }
    }

    pub fn sheet(&self, year: i32) -> Result<KpiSheet, KpiError> {
        self.repository
            .fetch(year)?
            .ok_or(KpiError::NotSeeded(year))
    }

    pub fn years(&self) -> Result<Vec<i32>, KpiError> {
        let mut years = self.repository.years()?;
        years.sort_unstable();
        Ok(years)
    }

    /// Record (or clear, with `None`) the actual for one quarter.
    pub fn record_quarter(
        &self,
        year: i32,
        code: &str,
        quarter: u8,
        value: Option<f64>,
    ) -> Result<KpiSheet, KpiError> {
        let indicator =
            Indicator::from_code(code).ok_or_else(|| KpiError::UnknownIndicator(code.to_string()))?;
        if !(1..=4).contains(&quarter) {
            return Err(KpiError::InvalidQuarter(quarter));
        }
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(KpiError::Validation(format!(
                    "actual for {} must be a non-negative number",
                    indicator.code()
                )));
            }
        }

        let mut sheet = self.sheet(year)?;
        let entry = sheet
            .entries
            .iter_mut()
            .find(|entry| entry.indicator == indicator)
            .ok_or_else(|| KpiError::UnknownIndicator(code.to_string()))?;
        entry.quarters[usize::from(quarter - 1)] = value;
        sheet.updated_at = Utc::now();

        self.repository.update(sheet.clone())?;
        info!(year, indicator = indicator.code(), quarter, "kpi actual recorded");
        Ok(sheet)
    }

    /// Render the sheet as CSV, blank cells for missing values.
    pub fn export_csv(&self, year: i32) -> Result<String, KpiError> {
        let sheet = self.sheet(year)?;
        render_csv(&sheet)
    }
}

pub(crate) fn render_csv(sheet: &KpiSheet) -> Result<String, KpiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "year",
        "indicator",
        "label",
        "unit",
        "target",
        "q1",
        "q2",
        "q3",
        "q4",
        "annual",
    ])?;

    for entry in &sheet.entries {
        let year = sheet.year.to_string();
        let mut row = vec![
            year,
            entry.indicator.code().to_string(),
            entry.label.clone(),
            entry.unit.clone(),
            cell(entry.target),
        ];
        row.extend(entry.quarters.iter().map(|quarter| cell(*quarter)));
        row.push(cell(entry.annual()));
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| KpiError::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| KpiError::Export(err.to_string()))
}

fn cell(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
pub enum KpiError {
    #[error("{0}")]
    Validation(String),
    #[error("KPI sheet for {0} already exists")]
    AlreadySeeded(i32),
    #[error("no KPI sheet for {0}")]
    NotSeeded(i32),
    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),
    #[error("quarter must be between 1 and 4, got {0}")]
    InvalidQuarter(u8),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write CSV: {0}")]
    Export(String),
    #[error(transparent)]
    Repository(#[from] KpiRepositoryError),
}
