//! WASM bridge exposing scenario simulation to JavaScript.

use chemo_core::{PlanConfig, ToxicityGrade, TreatmentError};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsPlanConfig {
    #[serde(default)]
    ips_high_score_threshold: Option<u8>,
    #[serde(default)]
    interim_pet_cycle: Option<u32>,
    #[serde(default)]
    deauville_excellent_max: Option<u8>,
    #[serde(default)]
    deauville_inadequate_min: Option<u8>,
    #[serde(default)]
    neutropenia_delay_grade: Option<ToxicityGrade>,
    #[serde(default)]
    thrombocytopenia_delay_grade: Option<ToxicityGrade>,
}

impl From<JsPlanConfig> for PlanConfig {
    fn from(cfg: JsPlanConfig) -> Self {
        let base = PlanConfig::default();
        PlanConfig {
            ips_high_score_threshold: cfg
                .ips_high_score_threshold
                .unwrap_or(base.ips_high_score_threshold),
            interim_pet_cycle: cfg.interim_pet_cycle.unwrap_or(base.interim_pet_cycle),
            deauville_excellent_max: cfg
                .deauville_excellent_max
                .unwrap_or(base.deauville_excellent_max),
            deauville_inadequate_min: cfg
                .deauville_inadequate_min
                .unwrap_or(base.deauville_inadequate_min),
            neutropenia_delay_grade: cfg
                .neutropenia_delay_grade
                .unwrap_or(base.neutropenia_delay_grade),
            thrombocytopenia_delay_grade: cfg
                .thrombocytopenia_delay_grade
                .unwrap_or(base.thrombocytopenia_delay_grade),
        }
    }
}

#[wasm_bindgen]
pub fn simulate_scenario(scenario: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let scenario_value = from_value::<serde_json::Value>(scenario)
        .map_err(|err| JsValue::from_str(&format!("Could not read scenario JSON: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsPlanConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            PlanConfig::from(cfg)
        }
        None => PlanConfig::default(),
    };

    let report = chemo_scenario::simulate_scenario_value(&scenario_value, &cfg)
        .map_err(|err| JsValue::from_str(&format_treatment_error(err)))?;

    to_value(&report).map_err(|err| JsValue::from_str(&format!("Could not serialize report: {err}")))
}

fn format_treatment_error(err: TreatmentError) -> String {
    format!("Treatment error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_js_config_keeps_defaults() {
        let cfg = JsPlanConfig {
            ips_high_score_threshold: Some(3),
            interim_pet_cycle: None,
            deauville_excellent_max: None,
            deauville_inadequate_min: None,
            neutropenia_delay_grade: None,
            thrombocytopenia_delay_grade: Some(ToxicityGrade::LifeThreatening),
        };
        let config = PlanConfig::from(cfg);
        assert_eq!(config.ips_high_score_threshold, 3);
        assert_eq!(config.interim_pet_cycle, 2);
        assert_eq!(config.thrombocytopenia_delay_grade, ToxicityGrade::LifeThreatening);
    }

    #[test]
    fn errors_are_prefixed() {
        assert_eq!(
            format_treatment_error(TreatmentError::NoActiveRegimen),
            "Treatment error: no active regimen; choose the initial regimen first"
        );
    }
}
