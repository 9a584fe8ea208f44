use serde::{Deserialize, Serialize};

/// Static dimensions of one vessel in an STS pair. Lengths in metres, displacement in tonnes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselParticulars {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub loa: Option<f64>,
    #[serde(default)]
    pub beam: Option<f64>,
    #[serde(default)]
    pub moulded_depth: Option<f64>,
    #[serde(default)]
    pub laden_draft: Option<f64>,
    #[serde(default)]
    pub ballast_draft: Option<f64>,
    #[serde(default)]
    pub displacement: Option<f64>,
}

impl VesselParticulars {
    pub fn loa(&self) -> Option<f64> {
        measured(self.loa)
    }

    pub fn beam(&self) -> Option<f64> {
        measured(self.beam)
    }

    pub fn moulded_depth(&self) -> Option<f64> {
        measured(self.moulded_depth)
    }

    pub fn laden_draft(&self) -> Option<f64> {
        measured(self.laden_draft)
    }

    pub fn ballast_draft(&self) -> Option<f64> {
        measured(self.ballast_draft)
    }

    pub fn displacement(&self) -> Option<f64> {
        measured(self.displacement)
    }

    /// Freeboard in ballast condition, the highest the deck will sit.
    pub fn max_freeboard(&self) -> Option<f64> {
        Some(self.moulded_depth()? - self.ballast_draft()?)
    }

    /// Freeboard fully laden.
    pub fn min_freeboard(&self) -> Option<f64> {
        Some(self.moulded_depth()? - self.laden_draft()?)
    }

    /// `1 + 2T/B` using the laden draft.
    pub fn added_mass_coefficient(&self) -> Option<f64> {
        Some(1.0 + 2.0 * self.laden_draft()? / self.beam()?)
    }
}

/// Tunable inputs of the berthing-energy and hose calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationOptions {
    /// Berthing velocity normal to the fender line, m/s.
    pub approach_velocity: f64,
    /// Eccentricity coefficient `Ce`.
    pub eccentricity_coefficient: f64,
    pub safety_factor: f64,
    /// Manifold height allowance added at each end of the hose, metres.
    pub manifold_allowance: f64,
    /// Stand-off between hulls created by the primary fenders, metres.
    pub fender_standoff: f64,
    pub hose_factor: f64,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            approach_velocity: 0.25,
            eccentricity_coefficient: 0.5,
            safety_factor: 1.5,
            manifold_allowance: 3.0,
            fender_standoff: 3.3,
            hose_factor: 1.25,
        }
    }
}

impl CalculationOptions {
    /// Replace any non-finite or non-positive option with its default.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            approach_velocity: measured(Some(self.approach_velocity))
                .unwrap_or(defaults.approach_velocity),
            eccentricity_coefficient: measured(Some(self.eccentricity_coefficient))
                .unwrap_or(defaults.eccentricity_coefficient),
            safety_factor: measured(Some(self.safety_factor)).unwrap_or(defaults.safety_factor),
            manifold_allowance: measured(Some(self.manifold_allowance))
                .unwrap_or(defaults.manifold_allowance),
            fender_standoff: measured(Some(self.fender_standoff))
                .unwrap_or(defaults.fender_standoff),
            hose_factor: measured(Some(self.hose_factor)).unwrap_or(defaults.hose_factor),
        }
    }
}

/// Two vessels plus options, as posted by the compatibility form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRequest {
    /// Ship to be lightered.
    #[serde(default)]
    pub stbl: VesselParticulars,
    /// Service ship.
    #[serde(default)]
    pub ss: VesselParticulars,
    #[serde(default)]
    pub options: CalculationOptions,
}

/// Blank, zero, negative and non-finite readings all count as missing.
pub(crate) fn measured(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && *value > 0.0)
}
