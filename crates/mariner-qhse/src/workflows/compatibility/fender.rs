use serde::Serialize;

use super::particulars::{measured, CalculationOptions};

/// Pneumatic fender size with its rated energy absorption at 60% deflection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PneumaticFender {
    pub designation: &'static str,
    pub diameter_m: f64,
    pub length_m: f64,
    pub rated_energy_kj: f64,
}

const fn fender(
    designation: &'static str,
    diameter_m: f64,
    length_m: f64,
    rated_energy_kj: f64,
) -> PneumaticFender {
    PneumaticFender {
        designation,
        diameter_m,
        length_m,
        rated_energy_kj,
    }
}

/// 50 kPa pneumatic fenders, smallest first.
pub const FENDER_CATALOG: [PneumaticFender; 8] = [
    fender("1.0 x 1.5", 1.0, 1.5, 32.0),
    fender("1.5 x 3.0", 1.5, 3.0, 153.0),
    fender("2.0 x 3.5", 2.0, 3.5, 308.0),
    fender("2.5 x 4.0", 2.5, 4.0, 663.0),
    fender("2.5 x 5.5", 2.5, 5.5, 943.0),
    fender("3.3 x 4.5", 3.3, 4.5, 1175.0),
    fender("3.3 x 6.5", 3.3, 6.5, 1814.0),
    fender("4.5 x 9.0", 4.5, 9.0, 4744.0),
];

pub const MIN_PRIMARY_FENDERS: u8 = 4;
pub const MAX_PRIMARY_FENDERS: u8 = 6;

/// `Δ1·Δ2 / (Δ1 + Δ2)` in tonnes.
pub fn virtual_displacement(first: Option<f64>, second: Option<f64>) -> Option<f64> {
    let first = measured(first)?;
    let second = measured(second)?;
    Some(first * second / (first + second))
}

/// Kinetic berthing energy `0.5 · Ce · Cm · Δv · V²` in kJ.
pub fn berthing_energy(
    virtual_displacement: Option<f64>,
    added_mass: Option<f64>,
    options: &CalculationOptions,
) -> Option<f64> {
    let displacement = measured(virtual_displacement)?;
    let added_mass = measured(added_mass)?;
    Some(
        0.5 * options.eccentricity_coefficient
            * added_mass
            * displacement
            * options.approach_velocity.powi(2),
    )
}

/// Smallest catalogued fender able to absorb `design_energy`; `None` when nothing is big enough.
pub fn select_fender(design_energy: f64) -> Option<&'static PneumaticFender> {
    if !design_energy.is_finite() {
        return None;
    }
    FENDER_CATALOG
        .iter()
        .find(|fender| fender.rated_energy_kj >= design_energy)
}

/// One primary fender per 60 m of the shorter ship, between four and six.
pub fn primary_fender_count(shorter_loa: f64) -> Option<u8> {
    let loa = measured(Some(shorter_loa))?;
    let count = (loa / 60.0).ceil();
    let clamped = count.clamp(f64::from(MIN_PRIMARY_FENDERS), f64::from(MAX_PRIMARY_FENDERS));
    Some(clamped as u8)
}
