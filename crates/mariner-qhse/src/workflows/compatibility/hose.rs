use serde::Serialize;

use super::particulars::{CalculationOptions, VesselParticulars};

/// Freeboard envelope of the pair across both loading conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FreeboardEnvelope {
    pub max_freeboard: Option<f64>,
    pub min_freeboard: Option<f64>,
    pub freeboard_diff: Option<f64>,
}

impl FreeboardEnvelope {
    /// Highest ballast freeboard against lowest laden freeboard of either ship.
    pub fn of(stbl: &VesselParticulars, ss: &VesselParticulars) -> Self {
        let max_freeboard = larger(stbl.max_freeboard(), ss.max_freeboard());
        let min_freeboard = smaller(stbl.min_freeboard(), ss.min_freeboard());
        let freeboard_diff = match (max_freeboard, min_freeboard) {
            (Some(max), Some(min)) => Some(max - min),
            _ => None,
        };

        Self {
            max_freeboard,
            min_freeboard,
            freeboard_diff,
        }
    }
}

/// Cargo hose length in whole metres for the given freeboard difference.
///
/// `(diff + standoff + 2 × manifold allowance) × hose factor`, rounded up. Non-decreasing in
/// `freeboard_diff`; a negative difference is treated as level decks.
pub fn hose_length(freeboard_diff: f64, options: &CalculationOptions) -> Option<f64> {
    if !freeboard_diff.is_finite() {
        return None;
    }
    let span = freeboard_diff.max(0.0) + options.fender_standoff + 2.0 * options.manifold_allowance;
    Some((span * options.hose_factor).ceil())
}

fn larger(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (Some(left), Some(right)) => Some(left.max(right)),
        (value, None) | (None, value) => value,
    }
}

fn smaller(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (Some(left), Some(right)) => Some(left.min(right)),
        (value, None) | (None, value) => value,
    }
}
