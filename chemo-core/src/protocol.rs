//! Fixed clinical thresholds and dosing constants of the simplified protocol.

use std::ops::RangeInclusive;

use crate::ToxicityGrade;

// Patient staging and prognosis.
pub const LOW_HEMOGLOBIN_IPS: f64 = 10.5;
pub const IPS_AGE_THRESHOLD: u32 = 45;
pub const FAVORABLE_STAGE_MAX: u8 = 2;
pub const FAVORABLE_LYMPH_SITES_MAX: u32 = 3;

/// Creatinine clearance (mL/min) below which Bleomycin is reduced.
pub const MIN_CREATININE_CLEARANCE_FULL_DOSE: f64 = 50.0;
pub const BLEOMYCIN_RENAL_FACTOR: f64 = 0.75;

/// Body surface area cap in m^2.
pub const BSA_CAP: f64 = 2.0;
/// Maximum single Vincristine dose in mg, regardless of BSA.
pub const VINCRISTINE_DOSE_CAP_MG: f64 = 2.0;

/// Lowest dose level a drug can be reduced to within one regimen.
pub const MIN_DOSE_LEVEL: i32 = -2;

pub const NEUROPATHY_GRADE_DOSE_REDUCE: ToxicityGrade = ToxicityGrade::Moderate;
pub const MYELOSUPPRESSION_GRADE_DOSE_REDUCE: ToxicityGrade = ToxicityGrade::Severe;

// Per-m^2 doses (mg) and per-level reduction steps.
pub const ABVD_DOXORUBICIN_PER_M2: f64 = 25.0;
pub const ABVD_BLEOMYCIN_PER_M2: f64 = 10.0;
pub const ABVD_VINBLASTINE_PER_M2: f64 = 6.0;
pub const ABVD_DACARBAZINE_PER_M2: f64 = 375.0;
pub const ABVD_LEVEL_STEP: f64 = 0.25;

pub const BEACOPP_ETOPOSIDE_PER_M2: f64 = 200.0;
pub const BEACOPP_DOXORUBICIN_PER_M2: f64 = 35.0;
pub const BEACOPP_CYCLOPHOSPHAMIDE_PER_M2: f64 = 1250.0;
pub const BEACOPP_VINCRISTINE_PER_M2: f64 = 1.4;
pub const BEACOPP_LEVEL_STEP: f64 = 0.20;

// Intake ranges accepted for a patient record.
pub const AGE_RANGE: RangeInclusive<u32> = 10..=100;
pub const HEIGHT_CM_RANGE: RangeInclusive<f64> = 100.0..=250.0;
pub const WEIGHT_KG_RANGE: RangeInclusive<f64> = 30.0..=200.0;
pub const STAGE_RANGE: RangeInclusive<u8> = 1..=4;
pub const LYMPH_SITES_RANGE: RangeInclusive<u32> = 0..=20;
pub const HEMOGLOBIN_RANGE: RangeInclusive<f64> = 5.0..=20.0;
pub const CREATININE_CLEARANCE_RANGE: RangeInclusive<f64> = 10.0..=200.0;
pub const BASELINE_NEUROPATHY_MAX: ToxicityGrade = ToxicityGrade::Moderate;

/// Multiplier applied to a full dose at the given (non-positive) dose level.
pub fn level_factor(level: i32, step: f64) -> f64 {
    1.0 + f64::from(level) * step
}
