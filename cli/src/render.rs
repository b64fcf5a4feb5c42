//! Plain-text rendering of plan outputs.

use std::fmt::Write;

use chemo_core::{Assessment, CycleReport, DrugDose, InterimPetOutcome, TreatmentReport};

fn dosage_lines(out: &mut String, dosages: &[DrugDose]) {
    for dose in dosages {
        let _ = writeln!(out, "{dose}");
    }
}

pub fn cycle(report: &CycleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n--- Starting Cycle {} of {} ({}) ---",
        report.cycle, report.total_cycles, report.regimen
    );
    let _ = writeln!(out, "Current dosages (per administration):");
    dosage_lines(&mut out, &report.dosages);
    out
}

pub fn assessment(assessment: &Assessment) -> String {
    let mut out = String::from("\n--- Analyzing Clinical Feedback ---\n");

    if let Some(reason) = assessment.delay {
        let _ = writeln!(
            out,
            "Severe Myelosuppression ({reason}): next cycle will be delayed."
        );
    }

    if let Some(reduction) = &assessment.dose_reduction {
        let drugs = reduction
            .drugs
            .iter()
            .map(|drug| drug.name())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "{} {} detected. Reduced {drugs} to dose level {}.",
            reduction.grade, reduction.trigger, reduction.dose_level
        );
    }

    match assessment.interim_pet {
        Some(InterimPetOutcome::Excellent { score }) => {
            let _ = writeln!(out, "Interim PET-CT Deauville score: {score}.");
            let _ = writeln!(
                out,
                "Excellent Response: de-escalating treatment. Bleomycin will be discontinued."
            );
        }
        Some(InterimPetOutcome::Adequate { score }) => {
            let _ = writeln!(out, "Interim PET-CT Deauville score: {score}.");
            let _ = writeln!(out, "Adequate Response: continuing the current regimen.");
        }
        Some(InterimPetOutcome::Inadequate { score }) => {
            let _ = writeln!(out, "Interim PET-CT Deauville score: {score}.");
            let _ = writeln!(
                out,
                "Inadequate Response: escalating treatment to a more intensive regimen."
            );
            let _ = writeln!(out, "\n*** TREATMENT HAS BEEN ESCALATED TO BEACOPP ***");
        }
        None => {}
    }

    out
}

pub fn final_report(report: &TreatmentReport) -> String {
    let mut out = String::from("\n\n--- End of Treatment ---\n");
    if !report.summary.is_empty() {
        let _ = write!(out, "Final Summary:\n{}", report.summary);
    }
    let _ = writeln!(
        out,
        "\nTotal cycles completed on final regimen: {}",
        report.current_cycle
    );
    let _ = writeln!(
        out,
        "Final Cumulative Doxorubicin Dose: {:.2} mg",
        report.cumulative_doxorubicin_mg
    );
    let _ = writeln!(out, "\nFinal Drug Dosages:");
    dosage_lines(&mut out, &report.dosages);
    out
}
