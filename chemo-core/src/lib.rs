//! Core rules for a simplified Hodgkin lymphoma chemotherapy course: regimen
//! selection, dose derivation and feedback-driven adjustment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod feedback;
mod metrics;
mod patient;
mod plan;
pub mod protocol;
mod regimen;

pub use feedback::{ClinicalFeedback, Toxicity, ToxicityGrade};
pub use metrics::BodyMetrics;
pub use patient::Patient;
pub use plan::{Assessment, CycleReport, InterimPetOutcome, TreatmentPlan, TreatmentSummary};
pub use regimen::{Abvd, Beacopp, DoseReduction, Drug, DrugDose, Regimen, RegimenKind};

/// Thresholds the treatment plan consults when choosing and steering a regimen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanConfig {
    /// IPS at or above which an unfavorable patient starts on BEACOPP.
    pub ips_high_score_threshold: u8,
    /// Cycle whose feedback carries the interim PET-CT reading.
    pub interim_pet_cycle: u32,
    /// Highest Deauville score read as an excellent response.
    pub deauville_excellent_max: u8,
    /// Lowest Deauville score read as an inadequate response.
    pub deauville_inadequate_min: u8,
    pub neutropenia_delay_grade: ToxicityGrade,
    pub thrombocytopenia_delay_grade: ToxicityGrade,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            ips_high_score_threshold: 4,
            interim_pet_cycle: 2,
            deauville_excellent_max: 2,
            deauville_inadequate_min: 4,
            neutropenia_delay_grade: ToxicityGrade::Severe,
            thrombocytopenia_delay_grade: ToxicityGrade::Severe,
        }
    }
}

/// End-of-treatment (or point-in-time) view of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentReport {
    pub generated_at: DateTime<Utc>,
    pub regimen: Option<RegimenKind>,
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub cumulative_doxorubicin_mg: f64,
    pub dosages: Vec<DrugDose>,
    pub summary: TreatmentSummary,
}

#[derive(Debug, thiserror::Error)]
pub enum TreatmentError {
    #[error("a regimen has already been chosen for this plan")]
    RegimenAlreadyChosen,
    #[error("no active regimen; choose the initial regimen first")]
    NoActiveRegimen,
    #[error("patient intake rejected: {}", .0.join("; "))]
    InvalidPatient(Vec<String>),
    #[error("input is missing required data")]
    MissingData,
    #[error("could not read input: {0}")]
    Parse(String),
}
