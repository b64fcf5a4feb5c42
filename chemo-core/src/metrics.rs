use serde::{Deserialize, Serialize};

use crate::protocol::BSA_CAP;

/// Height, weight and the body surface area derived from them.
///
/// The BSA is recomputed whenever the measurements change, so it can never
/// drift from the height and weight it was derived from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Measurements")]
pub struct BodyMetrics {
    height_cm: f64,
    weight_kg: f64,
    bsa: f64,
}

#[derive(Deserialize)]
struct Measurements {
    height_cm: f64,
    weight_kg: f64,
}

impl From<Measurements> for BodyMetrics {
    fn from(m: Measurements) -> Self {
        Self::new(m.height_cm, m.weight_kg)
    }
}

impl BodyMetrics {
    pub fn new(height_cm: f64, weight_kg: f64) -> Self {
        let mut metrics = Self::default();
        metrics.set(height_cm, weight_kg);
        metrics
    }

    /// Replace both measurements and recompute the BSA.
    pub fn set(&mut self, height_cm: f64, weight_kg: f64) {
        self.height_cm = height_cm;
        self.weight_kg = weight_kg;
        self.bsa = Self::calculate_bsa(height_cm, weight_kg);
    }

    /// Du Bois BSA in m^2, capped at [`BSA_CAP`]. Zero when either input is not positive.
    pub fn calculate_bsa(height_cm: f64, weight_kg: f64) -> f64 {
        if height_cm <= 0.0 || weight_kg <= 0.0 {
            return 0.0;
        }
        let bsa = 0.007184 * height_cm.powf(0.725) * weight_kg.powf(0.425);
        bsa.min(BSA_CAP)
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn bsa(&self) -> f64 {
        self.bsa
    }

    #[cfg(test)]
    pub(crate) fn with_bsa(bsa: f64) -> Self {
        Self {
            height_cm: 0.0,
            weight_kg: 0.0,
            bsa,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bsa_follows_du_bois() {
        let metrics = BodyMetrics::new(170.0, 70.0);
        let expected = 0.007184 * 170f64.powf(0.725) * 70f64.powf(0.425);
        assert!((metrics.bsa() - expected.min(2.0)).abs() < 1e-12);
        assert!(metrics.bsa() > 1.7 && metrics.bsa() < 1.9);
    }

    #[test]
    fn bsa_is_capped() {
        let metrics = BodyMetrics::new(250.0, 200.0);
        assert_eq!(metrics.bsa(), 2.0);
    }

    #[test]
    fn non_positive_inputs_give_zero() {
        assert_eq!(BodyMetrics::new(0.0, 70.0).bsa(), 0.0);
        assert_eq!(BodyMetrics::new(170.0, -1.0).bsa(), 0.0);
    }

    #[test]
    fn set_recomputes_bsa() {
        let mut metrics = BodyMetrics::new(170.0, 70.0);
        metrics.set(250.0, 200.0);
        assert_eq!(metrics.height_cm(), 250.0);
        assert_eq!(metrics.bsa(), 2.0);
    }

    #[test]
    fn deserializing_derives_bsa() {
        let metrics: BodyMetrics =
            serde_json::from_str(r#"{"height_cm": 250.0, "weight_kg": 200.0}"#).expect("metrics");
        assert_eq!(metrics.bsa(), 2.0);
    }
}
