use serde::{Deserialize, Serialize};

use crate::protocol::{
    AGE_RANGE, BASELINE_NEUROPATHY_MAX, CREATININE_CLEARANCE_RANGE, FAVORABLE_LYMPH_SITES_MAX,
    FAVORABLE_STAGE_MAX, HEIGHT_CM_RANGE, HEMOGLOBIN_RANGE, IPS_AGE_THRESHOLD, LOW_HEMOGLOBIN_IPS,
    LYMPH_SITES_RANGE, STAGE_RANGE, WEIGHT_KG_RANGE,
};
use crate::{BodyMetrics, ToxicityGrade, TreatmentError};

/// Patient record taken at intake.
///
/// Only `cumulative_doxorubicin_dose` changes after intake; the treatment
/// plan adds each administered Doxorubicin dose to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub age: u32,
    /// Ann Arbor stage, 1-4.
    pub stage: u8,
    pub has_b_symptoms: bool,
    pub has_bulky_tumors: bool,
    pub involved_lymph_node_sites: u32,
    /// Hemoglobin in g/dL.
    pub hemoglobin: f64,
    pub metrics: BodyMetrics,
    /// Creatinine clearance in mL/min.
    pub creatinine_clearance: f64,
    pub baseline_neuropathy_grade: ToxicityGrade,
    /// Doxorubicin administered so far, in mg.
    #[serde(default)]
    pub cumulative_doxorubicin_dose: f64,
}

impl Patient {
    pub fn is_favorable_early_stage(&self) -> bool {
        self.stage <= FAVORABLE_STAGE_MAX
            && !self.has_bulky_tumors
            && !self.has_b_symptoms
            && self.involved_lymph_node_sites <= FAVORABLE_LYMPH_SITES_MAX
    }

    /// Simplified International Prognostic Score (0-3).
    pub fn calculate_ips(&self) -> u8 {
        let mut score = 0;
        if self.age >= IPS_AGE_THRESHOLD {
            score += 1;
        }
        if self.stage == 4 {
            score += 1;
        }
        if self.hemoglobin < LOW_HEMOGLOBIN_IPS {
            score += 1;
        }
        score
    }

    /// Check every intake field against its accepted range.
    ///
    /// # Errors
    /// Returns [`TreatmentError::InvalidPatient`] listing every violation.
    pub fn validate(&self) -> Result<(), TreatmentError> {
        let mut errors = Vec::new();

        if !AGE_RANGE.contains(&self.age) {
            errors.push(format!("Age {} out of range {AGE_RANGE:?}", self.age));
        }
        if !HEIGHT_CM_RANGE.contains(&self.metrics.height_cm()) {
            errors.push(format!(
                "Height {} cm out of range {HEIGHT_CM_RANGE:?}",
                self.metrics.height_cm()
            ));
        }
        if !WEIGHT_KG_RANGE.contains(&self.metrics.weight_kg()) {
            errors.push(format!(
                "Weight {} kg out of range {WEIGHT_KG_RANGE:?}",
                self.metrics.weight_kg()
            ));
        }
        if !STAGE_RANGE.contains(&self.stage) {
            errors.push(format!("Stage {} out of range {STAGE_RANGE:?}", self.stage));
        }
        if !LYMPH_SITES_RANGE.contains(&self.involved_lymph_node_sites) {
            errors.push(format!(
                "Involved lymph node sites {} out of range {LYMPH_SITES_RANGE:?}",
                self.involved_lymph_node_sites
            ));
        }
        if !HEMOGLOBIN_RANGE.contains(&self.hemoglobin) {
            errors.push(format!(
                "Hemoglobin {} g/dL out of range {HEMOGLOBIN_RANGE:?}",
                self.hemoglobin
            ));
        }
        if !CREATININE_CLEARANCE_RANGE.contains(&self.creatinine_clearance) {
            errors.push(format!(
                "Creatinine clearance {} mL/min out of range {CREATININE_CLEARANCE_RANGE:?}",
                self.creatinine_clearance
            ));
        }
        if self.baseline_neuropathy_grade > BASELINE_NEUROPATHY_MAX {
            errors.push(format!(
                "Baseline neuropathy {} exceeds {BASELINE_NEUROPATHY_MAX}",
                self.baseline_neuropathy_grade
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TreatmentError::InvalidPatient(errors))
        }
    }
}
