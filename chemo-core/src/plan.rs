//! Treatment plan: regimen selection, cycle progression and feedback handling.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Beacopp, ClinicalFeedback, DoseReduction, Drug, DrugDose, Patient, PlanConfig, Regimen,
    RegimenKind, Toxicity, TreatmentError, TreatmentReport,
};

/// Append-only log of treatment decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TreatmentSummary(Vec<String>);

impl TreatmentSummary {
    fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TreatmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.0 {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Dosages administered in a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleReport {
    pub cycle: u32,
    pub total_cycles: u32,
    pub regimen: RegimenKind,
    pub dosages: Vec<DrugDose>,
}

/// How the interim PET-CT reading was acted on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum InterimPetOutcome {
    /// Bleomycin discontinued.
    Excellent { score: u8 },
    /// Regimen continues unchanged.
    Adequate { score: u8 },
    /// Escalated to BEACOPP.
    Inadequate { score: u8 },
}

/// Outcome of assessing one cycle's feedback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub delay: Option<Toxicity>,
    pub dose_reduction: Option<DoseReduction>,
    pub interim_pet: Option<InterimPetOutcome>,
}

#[derive(Debug, Clone)]
pub struct TreatmentPlan {
    patient: Patient,
    regimen: Option<Regimen>,
    current_cycle: u32,
    cycle_delayed: bool,
    summary: TreatmentSummary,
    config: PlanConfig,
}

impl TreatmentPlan {
    pub fn new(patient: Patient) -> Self {
        Self::with_config(patient, PlanConfig::default())
    }

    pub fn with_config(patient: Patient, config: PlanConfig) -> Self {
        Self {
            patient,
            regimen: None,
            current_cycle: 0,
            cycle_delayed: false,
            summary: TreatmentSummary::default(),
            config,
        }
    }

    /// Pick ABVD or BEACOPP from the patient's stage and IPS.
    ///
    /// # Errors
    /// [`TreatmentError::RegimenAlreadyChosen`] on a second call.
    pub fn choose_initial_regimen(&mut self) -> Result<RegimenKind, TreatmentError> {
        if self.regimen.is_some() {
            return Err(TreatmentError::RegimenAlreadyChosen);
        }

        let (kind, rationale) = if self.patient.is_favorable_early_stage() {
            (
                RegimenKind::Abvd,
                "Patient is Early-Stage Favorable. Starting ABVD.".to_string(),
            )
        } else {
            let ips = self.patient.calculate_ips();
            let threshold = self.config.ips_high_score_threshold;
            if ips >= threshold {
                (
                    RegimenKind::Beacopp,
                    format!("Patient has a high IPS score ({ips}). Starting BEACOPP."),
                )
            } else {
                (
                    RegimenKind::Abvd,
                    format!(
                        "Patient is Unfavorable/Advanced-Stage with IPS < {threshold}. Starting ABVD."
                    ),
                )
            }
        };

        info!(regimen = %kind, "{rationale}");
        self.summary.push(rationale);

        let regimen = Regimen::for_kind(kind, &self.patient);
        if let Regimen::Abvd(abvd) = &regimen {
            if abvd.bleomycin_renally_reduced() {
                self.summary.push(format!(
                    "Creatinine clearance {} mL/min below threshold. Bleomycin dose reduced by 25%.",
                    self.patient.creatinine_clearance
                ));
            }
        }
        self.regimen = Some(regimen);
        Ok(kind)
    }

    /// Administer the next cycle at the doses currently in effect.
    ///
    /// The cycle bound is not checked here; the driver stops at [`Self::total_cycles`].
    pub fn run_cycle(&mut self) -> Result<CycleReport, TreatmentError> {
        let regimen = self.regimen.as_ref().ok_or(TreatmentError::NoActiveRegimen)?;

        self.current_cycle += 1;
        if regimen.is_drug_active(Drug::Doxorubicin) {
            self.patient.cumulative_doxorubicin_dose += regimen.dose(Drug::Doxorubicin);
        }

        info!(
            cycle = self.current_cycle,
            total = regimen.cycles(),
            regimen = %regimen.kind(),
            "starting cycle"
        );

        Ok(CycleReport {
            cycle: self.current_cycle,
            total_cycles: regimen.cycles(),
            regimen: regimen.kind(),
            dosages: regimen.dosages(),
        })
    }

    /// Flag delays, adjust doses and act on the interim PET-CT.
    pub fn assess_feedback_and_adjust(
        &mut self,
        feedback: &ClinicalFeedback,
    ) -> Result<Assessment, TreatmentError> {
        let regimen = self.regimen.as_mut().ok_or(TreatmentError::NoActiveRegimen)?;

        self.cycle_delayed = false;
        let delay = if feedback.neutropenia_grade >= self.config.neutropenia_delay_grade {
            Some(Toxicity::Neutropenia)
        } else if feedback.thrombocytopenia_grade >= self.config.thrombocytopenia_delay_grade {
            Some(Toxicity::Thrombocytopenia)
        } else {
            None
        };
        if let Some(reason) = delay {
            self.cycle_delayed = true;
            warn!(%reason, "severe myelosuppression, next cycle will be delayed");
            self.summary.push(format!(
                "Cycle {} delayed due to {reason}.",
                self.current_cycle + 1
            ));
        }

        // Doses are adjusted even when the next cycle is delayed.
        let dose_reduction = regimen.adjust_doses(feedback, &self.patient);

        let interim_pet = match feedback.deauville_score() {
            Some(score) if self.current_cycle == self.config.interim_pet_cycle => {
                self.act_on_interim_pet(score)?
            }
            _ => None,
        };

        Ok(Assessment {
            delay,
            dose_reduction,
            interim_pet,
        })
    }

    fn act_on_interim_pet(
        &mut self,
        score: u8,
    ) -> Result<Option<InterimPetOutcome>, TreatmentError> {
        info!(score, "interim PET-CT Deauville score");
        if !matches!(self.regimen, Some(Regimen::Abvd(_))) {
            return Ok(None);
        }

        let cycle = self.current_cycle;
        if score <= self.config.deauville_excellent_max {
            if let Some(Regimen::Abvd(abvd)) = self.regimen.as_mut() {
                abvd.de_escalate();
            }
            info!("excellent response, Bleomycin discontinued");
            self.summary.push(format!(
                "Excellent PET response on cycle {cycle}. Bleomycin discontinued."
            ));
            Ok(Some(InterimPetOutcome::Excellent { score }))
        } else if score >= self.config.deauville_inadequate_min {
            self.summary.push(format!(
                "Inadequate PET response on cycle {cycle}. Escalating to BEACOPP."
            ));
            self.escalate_treatment()?;
            Ok(Some(InterimPetOutcome::Inadequate { score }))
        } else {
            Ok(Some(InterimPetOutcome::Adequate { score }))
        }
    }

    /// Replace the active regimen with a fresh BEACOPP and restart the cycle count.
    ///
    /// Dose-level history of the old regimen is discarded.
    pub fn escalate_treatment(&mut self) -> Result<(), TreatmentError> {
        if self.regimen.is_none() {
            return Err(TreatmentError::NoActiveRegimen);
        }
        self.current_cycle = 0;
        self.regimen = Some(Regimen::Beacopp(Beacopp::new(&self.patient)));
        warn!("treatment escalated to BEACOPP");
        Ok(())
    }

    /// Whether the feedback for the current cycle should carry a Deauville score.
    pub fn interim_pet_due(&self) -> bool {
        self.current_cycle == self.config.interim_pet_cycle
            && matches!(self.regimen, Some(Regimen::Abvd(_)))
    }

    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    /// Cycles in the active regimen, 0 before one is chosen.
    pub fn total_cycles(&self) -> u32 {
        self.regimen.as_ref().map_or(0, Regimen::cycles)
    }

    pub fn is_delayed(&self) -> bool {
        self.cycle_delayed
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn regimen(&self) -> Option<&Regimen> {
        self.regimen.as_ref()
    }

    pub fn summary(&self) -> &TreatmentSummary {
        &self.summary
    }

    pub fn report(&self) -> TreatmentReport {
        TreatmentReport {
            generated_at: Utc::now(),
            regimen: self.regimen.as_ref().map(Regimen::kind),
            current_cycle: self.current_cycle,
            total_cycles: self.total_cycles(),
            cumulative_doxorubicin_mg: self.patient.cumulative_doxorubicin_dose,
            dosages: self
                .regimen
                .as_ref()
                .map(Regimen::dosages)
                .unwrap_or_default(),
            summary: self.summary.clone(),
        }
    }
}
