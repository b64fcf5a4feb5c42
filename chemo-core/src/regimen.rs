//! Chemotherapy regimens and their per-drug dose state.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::protocol::{
    level_factor, ABVD_BLEOMYCIN_PER_M2, ABVD_DACARBAZINE_PER_M2, ABVD_DOXORUBICIN_PER_M2,
    ABVD_LEVEL_STEP, ABVD_VINBLASTINE_PER_M2, BEACOPP_CYCLOPHOSPHAMIDE_PER_M2,
    BEACOPP_DOXORUBICIN_PER_M2, BEACOPP_ETOPOSIDE_PER_M2, BEACOPP_LEVEL_STEP,
    BEACOPP_VINCRISTINE_PER_M2, BLEOMYCIN_RENAL_FACTOR, MIN_CREATININE_CLEARANCE_FULL_DOSE,
    MIN_DOSE_LEVEL, MYELOSUPPRESSION_GRADE_DOSE_REDUCE, NEUROPATHY_GRADE_DOSE_REDUCE,
    VINCRISTINE_DOSE_CAP_MG,
};
use crate::{ClinicalFeedback, Patient, Toxicity, ToxicityGrade};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Drug {
    Doxorubicin,
    Bleomycin,
    Vinblastine,
    Dacarbazine,
    Etoposide,
    Cyclophosphamide,
    Vincristine,
}

impl Drug {
    pub fn name(self) -> &'static str {
        match self {
            Self::Doxorubicin => "Doxorubicin",
            Self::Bleomycin => "Bleomycin",
            Self::Vinblastine => "Vinblastine",
            Self::Dacarbazine => "Dacarbazine",
            Self::Etoposide => "Etoposide",
            Self::Cyclophosphamide => "Cyclophosphamide",
            Self::Vincristine => "Vincristine",
        }
    }
}

impl fmt::Display for Drug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegimenKind {
    Abvd,
    Beacopp,
}

impl RegimenKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Abvd => "ABVD",
            Self::Beacopp => "BEACOPP",
        }
    }

    pub fn cycles(self) -> u32 {
        match self {
            Self::Abvd => 6,
            // Clinically 8; shortened in this model.
            Self::Beacopp => 6,
        }
    }
}

impl fmt::Display for RegimenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view of one drug's current dose. A zero dose means discontinued.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrugDose {
    pub drug: Drug,
    pub dose_mg: f64,
    /// 0 = full dose, negative = reduced.
    pub dose_level: i32,
}

impl DrugDose {
    pub fn is_active(&self) -> bool {
        self.dose_mg > 0.0
    }
}

impl fmt::Display for DrugDose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_active() {
            write!(f, " - {:<20}: {:.2} mg", self.drug.name(), self.dose_mg)
        } else {
            write!(f, " - {:<20}: Discontinued", self.drug.name())
        }
    }
}

/// A dose-level step taken in response to feedback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoseReduction {
    pub trigger: Toxicity,
    pub grade: ToxicityGrade,
    pub drugs: Vec<Drug>,
    pub dose_level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DoseSlot {
    dose_mg: f64,
    level: i32,
}

impl DoseSlot {
    fn full(dose_mg: f64) -> Self {
        Self { dose_mg, level: 0 }
    }

    fn view(self, drug: Drug) -> DrugDose {
        DrugDose {
            drug,
            dose_mg: self.dose_mg,
            dose_level: self.level,
        }
    }

    /// Drop one level and rederive the dose from the full dose.
    fn step_down(&mut self, full_dose_mg: f64, step: f64) {
        self.level -= 1;
        self.dose_mg = full_dose_mg * level_factor(self.level, step);
    }
}

/// Doxorubicin, Bleomycin, Vinblastine, Dacarbazine.
#[derive(Debug, Clone, PartialEq)]
pub struct Abvd {
    doxorubicin: DoseSlot,
    bleomycin: DoseSlot,
    vinblastine: DoseSlot,
    dacarbazine: DoseSlot,
    renal_reduction: bool,
}

impl Abvd {
    pub fn new(patient: &Patient) -> Self {
        let bsa = patient.metrics.bsa();
        let mut bleomycin = ABVD_BLEOMYCIN_PER_M2 * bsa;
        let renal_reduction = patient.creatinine_clearance < MIN_CREATININE_CLEARANCE_FULL_DOSE;
        if renal_reduction {
            warn!(
                creatinine_clearance = patient.creatinine_clearance,
                "kidney function below threshold, reducing Bleomycin dose"
            );
            bleomycin *= BLEOMYCIN_RENAL_FACTOR;
        }

        Self {
            doxorubicin: DoseSlot::full(ABVD_DOXORUBICIN_PER_M2 * bsa),
            bleomycin: DoseSlot::full(bleomycin),
            vinblastine: DoseSlot::full(ABVD_VINBLASTINE_PER_M2 * bsa),
            dacarbazine: DoseSlot::full(ABVD_DACARBAZINE_PER_M2 * bsa),
            renal_reduction,
        }
    }

    /// Whether Bleomycin started below full dose for poor kidney function.
    pub fn bleomycin_renally_reduced(&self) -> bool {
        self.renal_reduction
    }

    /// Reduce Vinblastine by one level on moderate or worse neuropathy.
    pub fn adjust_doses(
        &mut self,
        feedback: &ClinicalFeedback,
        patient: &Patient,
    ) -> Option<DoseReduction> {
        let grade = feedback.neuropathy_grade;
        if grade < NEUROPATHY_GRADE_DOSE_REDUCE || self.vinblastine.level <= MIN_DOSE_LEVEL {
            return None;
        }

        let full = ABVD_VINBLASTINE_PER_M2 * patient.metrics.bsa();
        self.vinblastine.step_down(full, ABVD_LEVEL_STEP);
        warn!(
            %grade,
            level = self.vinblastine.level,
            "neuropathy detected, Vinblastine dose reduced"
        );

        Some(DoseReduction {
            trigger: Toxicity::Neuropathy,
            grade,
            drugs: vec![Drug::Vinblastine],
            dose_level: self.vinblastine.level,
        })
    }

    /// Discontinue Bleomycin after an excellent interim response.
    pub fn de_escalate(&mut self) {
        self.discontinue(Drug::Bleomycin);
    }

    pub fn discontinue(&mut self, drug: Drug) -> bool {
        match self.slot_mut(drug) {
            Some(slot) => {
                slot.dose_mg = 0.0;
                true
            }
            None => false,
        }
    }

    pub fn dosages(&self) -> Vec<DrugDose> {
        vec![
            self.doxorubicin.view(Drug::Doxorubicin),
            self.bleomycin.view(Drug::Bleomycin),
            self.vinblastine.view(Drug::Vinblastine),
            self.dacarbazine.view(Drug::Dacarbazine),
        ]
    }

    fn slot_mut(&mut self, drug: Drug) -> Option<&mut DoseSlot> {
        match drug {
            Drug::Doxorubicin => Some(&mut self.doxorubicin),
            Drug::Bleomycin => Some(&mut self.bleomycin),
            Drug::Vinblastine => Some(&mut self.vinblastine),
            Drug::Dacarbazine => Some(&mut self.dacarbazine),
            _ => None,
        }
    }
}

/// Escalated regimen: Etoposide, Doxorubicin, Cyclophosphamide, Vincristine.
#[derive(Debug, Clone, PartialEq)]
pub struct Beacopp {
    etoposide: DoseSlot,
    doxorubicin: DoseSlot,
    cyclophosphamide: DoseSlot,
    vincristine: DoseSlot,
}

impl Beacopp {
    pub fn new(patient: &Patient) -> Self {
        let bsa = patient.metrics.bsa();
        let vincristine = (BEACOPP_VINCRISTINE_PER_M2 * bsa).min(VINCRISTINE_DOSE_CAP_MG);

        Self {
            etoposide: DoseSlot::full(BEACOPP_ETOPOSIDE_PER_M2 * bsa),
            doxorubicin: DoseSlot::full(BEACOPP_DOXORUBICIN_PER_M2 * bsa),
            cyclophosphamide: DoseSlot::full(BEACOPP_CYCLOPHOSPHAMIDE_PER_M2 * bsa),
            vincristine: DoseSlot::full(vincristine),
        }
    }

    /// On severe neutropenia, step down Etoposide, Doxorubicin and
    /// Cyclophosphamide together. Vincristine is left alone.
    pub fn adjust_doses(
        &mut self,
        feedback: &ClinicalFeedback,
        patient: &Patient,
    ) -> Option<DoseReduction> {
        let grade = feedback.neutropenia_grade;
        if grade < MYELOSUPPRESSION_GRADE_DOSE_REDUCE || self.etoposide.level <= MIN_DOSE_LEVEL {
            return None;
        }

        let bsa = patient.metrics.bsa();
        self.etoposide
            .step_down(BEACOPP_ETOPOSIDE_PER_M2 * bsa, BEACOPP_LEVEL_STEP);
        self.doxorubicin
            .step_down(BEACOPP_DOXORUBICIN_PER_M2 * bsa, BEACOPP_LEVEL_STEP);
        self.cyclophosphamide
            .step_down(BEACOPP_CYCLOPHOSPHAMIDE_PER_M2 * bsa, BEACOPP_LEVEL_STEP);
        warn!(
            %grade,
            level = self.etoposide.level,
            "severe myelosuppression, reducing Etoposide, Doxorubicin and Cyclophosphamide"
        );

        Some(DoseReduction {
            trigger: Toxicity::Neutropenia,
            grade,
            drugs: vec![Drug::Etoposide, Drug::Doxorubicin, Drug::Cyclophosphamide],
            dose_level: self.etoposide.level,
        })
    }

    pub fn discontinue(&mut self, drug: Drug) -> bool {
        match self.slot_mut(drug) {
            Some(slot) => {
                slot.dose_mg = 0.0;
                true
            }
            None => false,
        }
    }

    pub fn dosages(&self) -> Vec<DrugDose> {
        vec![
            self.etoposide.view(Drug::Etoposide),
            self.doxorubicin.view(Drug::Doxorubicin),
            self.cyclophosphamide.view(Drug::Cyclophosphamide),
            self.vincristine.view(Drug::Vincristine),
        ]
    }

    fn slot_mut(&mut self, drug: Drug) -> Option<&mut DoseSlot> {
        match drug {
            Drug::Etoposide => Some(&mut self.etoposide),
            Drug::Doxorubicin => Some(&mut self.doxorubicin),
            Drug::Cyclophosphamide => Some(&mut self.cyclophosphamide),
            Drug::Vincristine => Some(&mut self.vincristine),
            _ => None,
        }
    }
}

/// The regimen currently driving a treatment plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Regimen {
    Abvd(Abvd),
    Beacopp(Beacopp),
}

impl Regimen {
    /// Build a regimen with initial doses derived from the patient snapshot.
    pub fn for_kind(kind: RegimenKind, patient: &Patient) -> Self {
        match kind {
            RegimenKind::Abvd => Self::Abvd(Abvd::new(patient)),
            RegimenKind::Beacopp => Self::Beacopp(Beacopp::new(patient)),
        }
    }

    pub fn kind(&self) -> RegimenKind {
        match self {
            Self::Abvd(_) => RegimenKind::Abvd,
            Self::Beacopp(_) => RegimenKind::Beacopp,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn cycles(&self) -> u32 {
        self.kind().cycles()
    }

    /// Apply at most one dose-level step for the given feedback.
    pub fn adjust_doses(
        &mut self,
        feedback: &ClinicalFeedback,
        patient: &Patient,
    ) -> Option<DoseReduction> {
        match self {
            Self::Abvd(abvd) => abvd.adjust_doses(feedback, patient),
            Self::Beacopp(beacopp) => beacopp.adjust_doses(feedback, patient),
        }
    }

    /// Set a drug's dose to zero, leaving its dose level untouched.
    /// Returns `false` when the regimen does not contain the drug.
    pub fn discontinue(&mut self, drug: Drug) -> bool {
        match self {
            Self::Abvd(abvd) => abvd.discontinue(drug),
            Self::Beacopp(beacopp) => beacopp.discontinue(drug),
        }
    }

    pub fn dosages(&self) -> Vec<DrugDose> {
        match self {
            Self::Abvd(abvd) => abvd.dosages(),
            Self::Beacopp(beacopp) => beacopp.dosages(),
        }
    }

    fn lookup(&self, drug: Drug) -> Option<DrugDose> {
        self.dosages().into_iter().find(|dose| dose.drug == drug)
    }

    pub fn is_drug_active(&self, drug: Drug) -> bool {
        self.lookup(drug).is_some_and(|dose| dose.is_active())
    }

    /// Current dose in mg, or 0.0 when the drug is discontinued or not part of the regimen.
    pub fn dose(&self, drug: Drug) -> f64 {
        self.lookup(drug)
            .filter(DrugDose::is_active)
            .map_or(0.0, |dose| dose.dose_mg)
    }

    pub fn dose_level(&self, drug: Drug) -> Option<i32> {
        self.lookup(drug).map(|dose| dose.dose_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BodyMetrics;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn patient_with_bsa(bsa: f64, creatinine_clearance: f64) -> Patient {
        Patient {
            age: 30,
            stage: 2,
            involved_lymph_node_sites: 2,
            hemoglobin: 13.0,
            metrics: BodyMetrics::with_bsa(bsa),
            creatinine_clearance,
            ..Default::default()
        }
    }

    fn neuropathy(grade: ToxicityGrade) -> ClinicalFeedback {
        ClinicalFeedback {
            neuropathy_grade: grade,
            ..Default::default()
        }
    }

    fn neutropenia(grade: ToxicityGrade) -> ClinicalFeedback {
        ClinicalFeedback {
            neutropenia_grade: grade,
            ..Default::default()
        }
    }

    #[test]
    fn abvd_initial_doses() {
        let regimen = Regimen::for_kind(RegimenKind::Abvd, &patient_with_bsa(1.8, 60.0));
        assert_eq!(regimen.name(), "ABVD");
        assert_eq!(regimen.cycles(), 6);
        assert_close(regimen.dose(Drug::Doxorubicin), 45.0);
        assert_close(regimen.dose(Drug::Bleomycin), 18.0);
        assert_close(regimen.dose(Drug::Vinblastine), 10.8);
        assert_close(regimen.dose(Drug::Dacarbazine), 675.0);
        assert!(regimen.dosages().iter().all(|dose| dose.dose_level == 0));
    }

    #[test]
    fn abvd_reduces_bleomycin_once_for_poor_renal_function() {
        let patient = patient_with_bsa(1.8, 30.0);
        assert!(Abvd::new(&patient).bleomycin_renally_reduced());
        assert!(!Abvd::new(&patient_with_bsa(1.8, 60.0)).bleomycin_renally_reduced());

        let mut regimen = Regimen::for_kind(RegimenKind::Abvd, &patient);
        assert_close(regimen.dose(Drug::Bleomycin), 13.5);

        regimen.adjust_doses(&neuropathy(ToxicityGrade::Moderate), &patient);
        assert_close(regimen.dose(Drug::Bleomycin), 13.5);
    }

    #[test]
    fn vinblastine_floors_at_two_levels_down() {
        let patient = patient_with_bsa(2.0, 90.0);
        let mut regimen = Regimen::for_kind(RegimenKind::Abvd, &patient);

        let first = regimen
            .adjust_doses(&neuropathy(ToxicityGrade::Moderate), &patient)
            .expect("first reduction");
        assert_eq!(first.drugs, vec![Drug::Vinblastine]);
        assert_eq!(first.dose_level, -1);
        assert_close(regimen.dose(Drug::Vinblastine), 9.0);

        for _ in 0..5 {
            regimen.adjust_doses(&neuropathy(ToxicityGrade::Severe), &patient);
        }
        assert_eq!(regimen.dose_level(Drug::Vinblastine), Some(-2));
        assert_close(regimen.dose(Drug::Vinblastine), 6.0);
        assert_close(regimen.dose(Drug::Doxorubicin), 50.0);
    }

    #[test]
    fn mild_neuropathy_keeps_full_dose() {
        let patient = patient_with_bsa(2.0, 90.0);
        let mut regimen = Regimen::for_kind(RegimenKind::Abvd, &patient);
        assert!(regimen
            .adjust_doses(&neuropathy(ToxicityGrade::Mild), &patient)
            .is_none());
        assert_eq!(regimen.dose_level(Drug::Vinblastine), Some(0));
    }

    #[test]
    fn de_escalation_discontinues_bleomycin_without_touching_levels() {
        let patient = patient_with_bsa(2.0, 90.0);
        let mut abvd = Abvd::new(&patient);
        abvd.de_escalate();
        let regimen = Regimen::Abvd(abvd);

        assert!(!regimen.is_drug_active(Drug::Bleomycin));
        assert_eq!(regimen.dose(Drug::Bleomycin), 0.0);
        assert_eq!(regimen.dose_level(Drug::Bleomycin), Some(0));
        assert!(regimen.dosages().iter().any(|dose| dose.drug == Drug::Bleomycin));
    }

    #[test]
    fn unknown_drug_reads_as_inactive() {
        let mut regimen = Regimen::for_kind(RegimenKind::Abvd, &patient_with_bsa(2.0, 90.0));
        assert!(!regimen.is_drug_active(Drug::Etoposide));
        assert_eq!(regimen.dose(Drug::Etoposide), 0.0);
        assert_eq!(regimen.dose_level(Drug::Etoposide), None);
        assert!(!regimen.discontinue(Drug::Etoposide));
    }

    #[test]
    fn beacopp_initial_doses_cap_vincristine() {
        let regimen = Regimen::for_kind(RegimenKind::Beacopp, &patient_with_bsa(1.8, 90.0));
        assert_eq!(regimen.name(), "BEACOPP");
        assert_close(regimen.dose(Drug::Etoposide), 360.0);
        assert_close(regimen.dose(Drug::Doxorubicin), 63.0);
        assert_close(regimen.dose(Drug::Cyclophosphamide), 2250.0);
        assert_close(regimen.dose(Drug::Vincristine), 2.0);

        let small = Regimen::for_kind(RegimenKind::Beacopp, &patient_with_bsa(1.2, 90.0));
        assert_close(small.dose(Drug::Vincristine), 1.68);
    }

    #[test]
    fn beacopp_steps_three_drugs_together_on_severe_neutropenia() {
        let patient = patient_with_bsa(2.0, 90.0);
        let mut regimen = Regimen::for_kind(RegimenKind::Beacopp, &patient);

        assert!(regimen
            .adjust_doses(&neutropenia(ToxicityGrade::Moderate), &patient)
            .is_none());

        let reduction = regimen
            .adjust_doses(&neutropenia(ToxicityGrade::LifeThreatening), &patient)
            .expect("reduction");
        assert_eq!(reduction.trigger, Toxicity::Neutropenia);
        assert_eq!(reduction.drugs.len(), 3);
        assert_close(regimen.dose(Drug::Etoposide), 320.0);
        assert_close(regimen.dose(Drug::Doxorubicin), 56.0);
        assert_close(regimen.dose(Drug::Cyclophosphamide), 2000.0);
        assert_close(regimen.dose(Drug::Vincristine), 2.0);
        assert_eq!(regimen.dose_level(Drug::Vincristine), Some(0));

        for _ in 0..4 {
            regimen.adjust_doses(&neutropenia(ToxicityGrade::Severe), &patient);
        }
        assert_eq!(regimen.dose_level(Drug::Etoposide), Some(-2));
        assert_eq!(regimen.dose_level(Drug::Cyclophosphamide), Some(-2));
        assert_close(regimen.dose(Drug::Etoposide), 240.0);
        assert_close(regimen.dose(Drug::Doxorubicin), 42.0);
    }

    #[test]
    fn dosage_view_renders_discontinued_drugs() {
        let dose = DrugDose {
            drug: Drug::Bleomycin,
            dose_mg: 0.0,
            dose_level: 0,
        };
        assert_eq!(dose.to_string(), format!(" - {:<20}: Discontinued", "Bleomycin"));

        let dose = DrugDose {
            drug: Drug::Doxorubicin,
            dose_mg: 45.0,
            dose_level: 0,
        };
        assert!(dose.to_string().ends_with(": 45.00 mg"));
    }
}
