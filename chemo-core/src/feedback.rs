use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TreatmentError;

/// CTCAE toxicity grade. Serialized as its ordinal.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum ToxicityGrade {
    #[default]
    None = 0,
    Mild = 1,
    Moderate = 2,
    Severe = 3,
    LifeThreatening = 4,
}

impl ToxicityGrade {
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ToxicityGrade {
    type Error = TreatmentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Mild),
            2 => Ok(Self::Moderate),
            3 => Ok(Self::Severe),
            4 => Ok(Self::LifeThreatening),
            other => Err(TreatmentError::Parse(format!(
                "toxicity grade must be 0-4, received {other}"
            ))),
        }
    }
}

impl From<ToxicityGrade> for u8 {
    fn from(grade: ToxicityGrade) -> Self {
        grade.ordinal()
    }
}

impl fmt::Display for ToxicityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grade {}", self.ordinal())
    }
}

/// Toxicities tracked in the per-cycle feedback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Toxicity {
    Neutropenia,
    Thrombocytopenia,
    Neuropathy,
}

impl fmt::Display for Toxicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Neutropenia => "Neutropenia",
            Self::Thrombocytopenia => "Thrombocytopenia",
            Self::Neuropathy => "Peripheral neuropathy",
        })
    }
}

/// Graded clinical observations collected after a cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClinicalFeedback {
    pub neutropenia_grade: ToxicityGrade,
    /// Low platelets.
    pub thrombocytopenia_grade: ToxicityGrade,
    pub neuropathy_grade: ToxicityGrade,
    /// Interim PET-CT Deauville score; 0 when no scan was read.
    pub pet_ct_deauville_score: u8,
}

impl ClinicalFeedback {
    /// The Deauville score when it is a real reading (1-5).
    pub fn deauville_score(&self) -> Option<u8> {
        Some(self.pet_ct_deauville_score).filter(|score| (1..=5).contains(score))
    }
}
