//! Integration specifications for the STS compatibility calculation as posted by the form.

use mariner_qhse::workflows::compatibility::{assess, CompatibilityRequest, FENDER_CATALOG};
use serde_json::json;

fn posted_pair() -> CompatibilityRequest {
    serde_json::from_value(json!({
        "stbl": {
            "name": "MT Aurora",
            "loa": 274.0,
            "beam": 48.0,
            "moulded_depth": 23.1,
            "laden_draft": 17.0,
            "ballast_draft": 8.2,
            "displacement": 185000.0
        },
        "ss": {
            "name": "MT Boreas",
            "loa": 228.0,
            "beam": 32.2,
            "moulded_depth": 20.0,
            "laden_draft": 14.4,
            "ballast_draft": 6.5,
            "displacement": 85000.0
        },
        "options": { "approach_velocity": 0.3 }
    }))
    .expect("form payload deserializes")
}

#[test]
fn laden_aframax_alongside_ballast_suezmax() {
    let report = assess(&posted_pair());

    let diff = report.freeboard.freeboard_diff.expect("difference known");
    // max(23.1-8.2, 20-6.5) = 14.9, min(23.1-17, 20-14.4) = 5.6
    assert!((diff - 9.3).abs() < 1e-9);
    // (9.3 + 3.3 + 6.0) * 1.25 = 23.25
    assert_eq!(report.hose_length, Some(24.0));
    assert_eq!(report.options.approach_velocity, 0.3);
    assert_eq!(report.options.safety_factor, 1.5);

    let design = report.design_energy.expect("design energy known");
    let fender = report.selected_fender.expect("a fender is large enough");
    assert!(fender.rated_energy_kj >= design);
    assert!(FENDER_CATALOG
        .iter()
        .filter(|candidate| candidate.rated_energy_kj < fender.rated_energy_kj)
        .all(|smaller| smaller.rated_energy_kj < design));
    assert_eq!(report.primary_fender_count, Some(4));
}

#[test]
fn blank_form_fields_produce_blank_results() {
    let mut request = posted_pair();
    request.ss.moulded_depth = None;
    request.stbl.moulded_depth = None;
    request.ss.beam = Some(0.0);

    let report = assess(&request);

    assert_eq!(report.freeboard.freeboard_diff, None);
    assert_eq!(report.hose_length, None);
    assert_eq!(report.ss.added_mass_coefficient, None);
    assert!(report.stbl.added_mass_coefficient.is_some());
    assert!(report.design_energy.is_some());
}

#[test]
fn hose_length_grows_with_freeboard_difference() {
    let mut lengths = Vec::new();
    for ballast in [8.2, 7.0, 6.0, 5.0, 4.0] {
        let mut request = posted_pair();
        request.stbl.ballast_draft = Some(ballast);
        lengths.push(assess(&request).hose_length.expect("length known"));
    }
    assert!(lengths.windows(2).all(|pair| pair[0] <= pair[1]));
}
