//! Strength calculations - estimated one-rep-max and volume load

use serde::{Deserialize, Serialize};

/// Estimate a one-rep-max with the Epley relation.
///
/// A single rep is already a max, so the weight comes back unchanged.
/// No rounding is applied here; round only when presenting.
pub fn estimate_one_rep_max(weight: f64, reps: u32) -> f64 {
    if reps == 1 {
        return weight;
    }
    weight * (1.0 + reps as f64 / 30.0)
}

/// Volume load of a single set (weight × reps)
pub fn volume_load(weight: f64, reps: u32) -> f64 {
    weight * reps as f64
}

/// Alternative one-rep-max formulas, used for progression reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formula {
    Epley,
    Brzycki,
    Lander,
    Lombardi,
    Mayhew,
    Wathan,
    /// Mean of all the above
    Average,
}

impl Formula {
    pub fn all() -> &'static [Formula] {
        &[
            Formula::Epley,
            Formula::Brzycki,
            Formula::Lander,
            Formula::Lombardi,
            Formula::Mayhew,
            Formula::Wathan,
            Formula::Average,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Formula::Epley => "Epley",
            Formula::Brzycki => "Brzycki",
            Formula::Lander => "Lander",
            Formula::Lombardi => "Lombardi",
            Formula::Mayhew => "Mayhew",
            Formula::Wathan => "Wathan",
            Formula::Average => "Average",
        }
    }

    pub fn estimate(&self, weight: f64, reps: u32) -> f64 {
        if reps == 1 {
            return weight;
        }
        let r = reps as f64;
        match self {
            Formula::Epley => estimate_one_rep_max(weight, reps),
            // Breaks down at 37+ reps
            Formula::Brzycki if reps >= 37 => estimate_one_rep_max(weight, reps),
            Formula::Brzycki => weight * (36.0 / (37.0 - r)),
            Formula::Lander => {
                let denominator = 101.3 - 2.67123 * r;
                if denominator <= 0.0 {
                    estimate_one_rep_max(weight, reps)
                } else {
                    100.0 * weight / denominator
                }
            }
            Formula::Lombardi => weight * r.powf(0.1),
            Formula::Mayhew => 100.0 * weight / (52.2 + 41.9 * (-0.055 * r).exp()),
            Formula::Wathan => 100.0 * weight / (48.8 + 53.8 * (-0.075 * r).exp()),
            Formula::Average => {
                let singles = &Formula::all()[..6];
                singles.iter().map(|f| f.estimate(weight, reps)).sum::<f64>() / singles.len() as f64
            }
        }
    }
}
