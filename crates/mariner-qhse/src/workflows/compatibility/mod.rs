//! Ship-to-ship compatibility math: freeboard envelope, cargo hose length, and fender sizing.
//!
//! Every figure is optional. A missing or unusable input leaves the dependent outputs empty
//! instead of failing the whole assessment.

mod fender;
mod hose;
mod particulars;
mod router;

pub use fender::{
    berthing_energy, primary_fender_count, select_fender, virtual_displacement, PneumaticFender,
    FENDER_CATALOG, MAX_PRIMARY_FENDERS, MIN_PRIMARY_FENDERS,
};
pub use hose::{hose_length, FreeboardEnvelope};
pub use particulars::{CalculationOptions, CompatibilityRequest, VesselParticulars};
pub use router::compatibility_router;

use serde::Serialize;

/// Derived figures for one vessel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselFigures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub max_freeboard: Option<f64>,
    pub min_freeboard: Option<f64>,
    pub added_mass_coefficient: Option<f64>,
}

impl VesselFigures {
    fn of(vessel: &VesselParticulars) -> Self {
        Self {
            name: vessel.name.clone(),
            max_freeboard: vessel.max_freeboard(),
            min_freeboard: vessel.min_freeboard(),
            added_mass_coefficient: vessel.added_mass_coefficient(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityReport {
    pub stbl: VesselFigures,
    pub ss: VesselFigures,
    #[serde(flatten)]
    pub freeboard: FreeboardEnvelope,
    pub hose_length: Option<f64>,
    pub added_mass_coefficient: Option<f64>,
    pub virtual_displacement: Option<f64>,
    pub berthing_energy: Option<f64>,
    pub design_energy: Option<f64>,
    pub selected_fender: Option<PneumaticFender>,
    pub primary_fender_count: Option<u8>,
    pub options: CalculationOptions,
}

/// Run every calculation for the pair.
pub fn assess(request: &CompatibilityRequest) -> CompatibilityReport {
    let options = request.options.sanitized();
    let stbl = VesselFigures::of(&request.stbl);
    let ss = VesselFigures::of(&request.ss);

    let freeboard = FreeboardEnvelope::of(&request.stbl, &request.ss);
    let hose_length = freeboard
        .freeboard_diff
        .and_then(|diff| hose_length(diff, &options));

    let added_mass_coefficient = match (stbl.added_mass_coefficient, ss.added_mass_coefficient) {
        (Some(left), Some(right)) => Some(left.max(right)),
        (value, None) | (None, value) => value,
    };
    let virtual_displacement = virtual_displacement(
        request.stbl.displacement(),
        request.ss.displacement(),
    );
    let berthing_energy = berthing_energy(virtual_displacement, added_mass_coefficient, &options);
    let design_energy = berthing_energy.map(|energy| energy * options.safety_factor);
    let selected_fender = design_energy.and_then(select_fender).copied();

    let shorter_loa = match (request.stbl.loa(), request.ss.loa()) {
        (Some(left), Some(right)) => Some(left.min(right)),
        _ => None,
    };
    let primary_fender_count = shorter_loa.and_then(primary_fender_count);

    CompatibilityReport {
        stbl,
        ss,
        freeboard,
        hose_length,
        added_mass_coefficient,
        virtual_displacement,
        berthing_energy,
        design_energy,
        selected_fender,
        primary_fender_count,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompatibilityRequest {
        CompatibilityRequest {
            stbl: VesselParticulars {
                name: Some("MT Aurora".to_string()),
                loa: Some(333.0),
                beam: Some(60.0),
                moulded_depth: Some(30.0),
                laden_draft: Some(21.0),
                ballast_draft: Some(9.0),
                displacement: Some(300_000.0),
            },
            ss: VesselParticulars {
                name: Some("MT Boreas".to_string()),
                loa: Some(250.0),
                beam: Some(44.0),
                moulded_depth: Some(21.0),
                laden_draft: Some(15.0),
                ballast_draft: Some(7.0),
                displacement: Some(100_000.0),
            },
            options: CalculationOptions::default(),
        }
    }

    #[test]
    fn full_particulars_produce_every_figure() {
        let report = assess(&request());

        // max(30-9, 21-7) = 21, min(30-21, 21-15) = 6
        assert_eq!(report.freeboard.max_freeboard, Some(21.0));
        assert_eq!(report.freeboard.min_freeboard, Some(6.0));
        assert_eq!(report.freeboard.freeboard_diff, Some(15.0));
        // (15 + 3.3 + 6) * 1.25 = 30.375
        assert_eq!(report.hose_length, Some(31.0));
        // max(1 + 42/60, 1 + 30/44)
        assert!((report.added_mass_coefficient.unwrap() - 1.7).abs() < 1e-9);
        assert_eq!(report.virtual_displacement, Some(75_000.0));
        // 0.5 * 0.5 * 1.7 * 75000 * 0.0625 = 1992.1875, * 1.5 = 2988.28125
        assert!((report.berthing_energy.unwrap() - 1992.1875).abs() < 1e-6);
        assert!((report.design_energy.unwrap() - 2988.281_25).abs() < 1e-6);
        assert_eq!(
            report.selected_fender.map(|fender| fender.designation),
            Some("4.5 x 9.0")
        );
        assert_eq!(report.primary_fender_count, Some(5));
    }

    #[test]
    fn missing_inputs_blank_only_dependent_outputs() {
        let mut request = request();
        request.ss.displacement = None;
        request.stbl.loa = Some(f64::NAN);

        let report = assess(&request);

        assert_eq!(report.freeboard.freeboard_diff, Some(15.0));
        assert_eq!(report.hose_length, Some(31.0));
        assert_eq!(report.virtual_displacement, None);
        assert_eq!(report.berthing_energy, None);
        assert_eq!(report.selected_fender, None);
        assert_eq!(report.primary_fender_count, None);
    }

    #[test]
    fn empty_request_yields_blank_report() {
        let report = assess(&CompatibilityRequest::default());
        assert_eq!(report.hose_length, None);
        assert_eq!(report.design_energy, None);
        assert_eq!(report.options, CalculationOptions::default());
    }

    #[test]
    fn report_serializes_flat_freeboard_fields() {
        let value = serde_json::to_value(assess(&request())).unwrap();
        assert_eq!(value["freeboard_diff"], serde_json::json!(15.0));
        assert_eq!(value["stbl"]["name"], serde_json::json!("MT Aurora"));
        assert!(value["ss"]["max_freeboard"].is_number());
    }
}
