//! Console intake with range-checked re-prompting.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::ops::RangeInclusive;
use std::str::FromStr;

use anyhow::bail;
use chemo_core::protocol::{
    AGE_RANGE, BASELINE_NEUROPATHY_MAX, CREATININE_CLEARANCE_RANGE, HEIGHT_CM_RANGE,
    HEMOGLOBIN_RANGE, LYMPH_SITES_RANGE, STAGE_RANGE, WEIGHT_KG_RANGE,
};
use chemo_core::{BodyMetrics, ClinicalFeedback, Patient, ToxicityGrade};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed before all answers were given");
        }
        Ok(line.trim().to_string())
    }

    fn ask(&mut self, prompt: &str) -> anyhow::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        self.read_line()
    }

    /// Ask until the answer parses and falls inside `range`.
    pub fn number<T>(&mut self, prompt: &str, range: RangeInclusive<T>) -> anyhow::Result<T>
    where
        T: FromStr + PartialOrd + Display,
    {
        loop {
            let answer = self.ask(prompt)?;
            match answer.parse::<T>() {
                Ok(value) if range.contains(&value) => return Ok(value),
                _ => writeln!(
                    self.output,
                    "Invalid input. Please enter a number between {} and {}.",
                    range.start(),
                    range.end()
                )?,
            }
        }
    }

    fn flag(&mut self, prompt: &str) -> anyhow::Result<bool> {
        Ok(self.number(prompt, 0u8..=1)? == 1)
    }

    fn grade(&mut self, prompt: &str, max: ToxicityGrade) -> anyhow::Result<ToxicityGrade> {
        let ordinal = self.number(prompt, 0..=max.ordinal())?;
        Ok(ToxicityGrade::try_from(ordinal)?)
    }

    pub fn patient(&mut self) -> anyhow::Result<Patient> {
        writeln!(self.output, "--- Entering Patient Data ---")?;
        let age = self.number("Enter patient age: ", AGE_RANGE)?;
        let height_cm = self.number("Enter height in cm: ", HEIGHT_CM_RANGE)?;
        let weight_kg = self.number("Enter weight in kg: ", WEIGHT_KG_RANGE)?;
        let metrics = BodyMetrics::new(height_cm, weight_kg);
        writeln!(self.output, " > Calculated BSA: {:.2} m^2", metrics.bsa())?;

        let stage = self.number("Enter Hodgkin's Lymphoma stage (1-4): ", STAGE_RANGE)?;
        let has_b_symptoms =
            self.flag("Does the patient have 'B symptoms' (1 for Yes, 0 for No): ")?;
        let has_bulky_tumors = self.flag("Is there bulky disease (1 for Yes, 0 for No): ")?;
        let involved_lymph_node_sites =
            self.number("Number of involved lymph node sites: ", LYMPH_SITES_RANGE)?;
        let hemoglobin =
            self.number("Enter patient's hemoglobin level (g/dL): ", HEMOGLOBIN_RANGE)?;
        let creatinine_clearance = self.number(
            "Enter creatinine clearance (for kidney function, mL/min): ",
            CREATININE_CLEARANCE_RANGE,
        )?;
        let baseline_neuropathy_grade = self.grade(
            "Enter baseline peripheral neuropathy grade (0-2): ",
            BASELINE_NEUROPATHY_MAX,
        )?;

        Ok(Patient {
            age,
            stage,
            has_b_symptoms,
            has_bulky_tumors,
            involved_lymph_node_sites,
            hemoglobin,
            metrics,
            creatinine_clearance,
            baseline_neuropathy_grade,
            cumulative_doxorubicin_dose: 0.0,
        })
    }

    /// Collect graded feedback; the Deauville score is asked only when the interim PET is due.
    pub fn feedback(
        &mut self,
        cycle: u32,
        interim_pet_due: bool,
    ) -> anyhow::Result<ClinicalFeedback> {
        writeln!(
            self.output,
            "\n--- Enter Graded Clinical Feedback for Cycle {cycle} ---"
        )?;
        let max = ToxicityGrade::LifeThreatening;
        let neutropenia_grade = self.grade("Enter Neutropenia grade (0-4): ", max)?;
        let thrombocytopenia_grade =
            self.grade("Enter Thrombocytopenia (low platelet) grade (0-4): ", max)?;
        let neuropathy_grade = self.grade("Enter Peripheral Neuropathy grade (0-4): ", max)?;

        let pet_ct_deauville_score = if interim_pet_due {
            self.number("Enter interim PET-CT Deauville score (1-5): ", 1u8..=5)?
        } else {
            0
        };

        Ok(ClinicalFeedback {
            neutropenia_grade,
            thrombocytopenia_grade,
            neuropathy_grade,
            pet_ct_deauville_score,
        })
    }

    pub fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        let answer = self.ask(prompt)?;
        Ok(matches!(answer.as_str(), "Y" | "y"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn reprompts_until_in_range() {
        let mut p = prompter("abc\n300\n42\n");
        assert_eq!(p.number("Age: ", 10u32..=100).ok(), Some(42));
        let output = String::from_utf8(p.output).expect("utf8");
        assert_eq!(output.matches("Invalid input").count(), 2);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut p = prompter("");
        assert!(p.number("Age: ", 10u32..=100).is_err());
    }

    #[test]
    fn reads_full_patient_record() {
        let mut p = prompter("30\n250\n200\n2\n0\n0\n2\n13.0\n90\n1\n");
        let patient = p.patient().expect("patient");
        assert_eq!(patient.age, 30);
        assert_eq!(patient.metrics.bsa(), 2.0);
        assert!(patient.is_favorable_early_stage());
        assert_eq!(patient.baseline_neuropathy_grade, ToxicityGrade::Mild);
        assert!(patient.validate().is_ok());
    }

    #[test]
    fn deauville_only_asked_when_due() {
        let mut p = prompter("0\n0\n2\n");
        let feedback = p.feedback(1, false).expect("feedback");
        assert_eq!(feedback.neuropathy_grade, ToxicityGrade::Moderate);
        assert_eq!(feedback.pet_ct_deauville_score, 0);

        let mut p = prompter("3\n0\n0\n9\n5\n");
        let feedback = p.feedback(2, true).expect("feedback");
        assert_eq!(feedback.neutropenia_grade, ToxicityGrade::Severe);
        assert_eq!(feedback.pet_ct_deauville_score, 5);
    }

    #[test]
    fn confirm_accepts_only_yes() {
        assert!(prompter("y\n").confirm("? ").expect("answer"));
        assert!(!prompter("n\n").confirm("? ").expect("answer"));
    }
}
