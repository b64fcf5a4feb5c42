//! JSON scenario to `TreatmentReport` driver.
//!
//! A scenario is a patient intake record plus the feedback collected after
//! each administered cycle. The driver runs the plan until the active regimen
//! completes or the feedback runs out.

use chemo_core::{
    ClinicalFeedback, Patient, PlanConfig, TreatmentError, TreatmentPlan, TreatmentReport,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub patient: Patient,
    /// Overrides the caller's config when present.
    #[serde(default)]
    pub config: Option<PlanConfig>,
    /// One entry per administered cycle, in order.
    #[serde(default)]
    pub feedback: Vec<ClinicalFeedback>,
}

/// Simulate a scenario from a JSON string.
pub fn simulate_scenario_str(
    scenario_json: &str,
    config: &PlanConfig,
) -> Result<TreatmentReport, TreatmentError> {
    let value: Value =
        serde_json::from_str(scenario_json).map_err(|err| TreatmentError::Parse(err.to_string()))?;
    simulate_scenario_value(&value, config)
}

/// Simulate a scenario from a `serde_json::Value`.
pub fn simulate_scenario_value(
    scenario: &Value,
    config: &PlanConfig,
) -> Result<TreatmentReport, TreatmentError> {
    if scenario.get("patient").is_none() {
        return Err(TreatmentError::MissingData);
    }
    let scenario = Scenario::deserialize(scenario)
        .map_err(|err| TreatmentError::Parse(err.to_string()))?;
    simulate(&scenario, config)
}

/// Run the orchestration loop over an already parsed scenario.
pub fn simulate(scenario: &Scenario, config: &PlanConfig) -> Result<TreatmentReport, TreatmentError> {
    scenario.patient.validate()?;

    let config = scenario.config.clone().unwrap_or_else(|| config.clone());
    let mut plan = TreatmentPlan::with_config(scenario.patient.clone(), config);
    plan.choose_initial_regimen()?;

    let mut feedback = scenario.feedback.iter();
    // Re-checked every pass: escalation resets the cycle and may change the total.
    while plan.current_cycle() < plan.total_cycles() {
        let Some(record) = feedback.next() else {
            info!(
                cycle = plan.current_cycle(),
                "feedback exhausted, stopping treatment"
            );
            break;
        };

        plan.run_cycle()?;
        let collected = collect_feedback(record, plan.interim_pet_due());
        let assessment = plan.assess_feedback_and_adjust(&collected)?;
        debug!(?assessment, cycle = plan.current_cycle(), "cycle assessed");
    }

    Ok(plan.report())
}

/// A Deauville score is only collected when the interim PET is due.
fn collect_feedback(record: &ClinicalFeedback, interim_pet_due: bool) -> ClinicalFeedback {
    ClinicalFeedback {
        pet_ct_deauville_score: if interim_pet_due {
            record.pet_ct_deauville_score
        } else {
            0
        },
        ..*record
    }
}
