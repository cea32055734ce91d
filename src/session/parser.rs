//! Shorthand set input
//!
//! Accepted forms, case-insensitive, surrounding whitespace ignored:
//! - `s` repeats the previous set
//! - `+5`, `-10 8`, `+5 6 9` adjust the previous weight, optionally with new reps and RPE
//! - `185 10`, `185.5 8 8.5` give weight, reps and optional RPE explicitly

use thiserror::Error;

/// Weight, reps and optional RPE of one set, before it is stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
}

impl SetEntry {
    pub fn new(weight: f64, reps: u32, rpe: Option<f64>) -> Self {
        Self { weight, reps, rpe }
    }

    /// Bounds every stored set must respect
    pub fn check(&self) -> Result<(), RejectReason> {
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(RejectReason::NonPositiveWeight);
        }
        if self.reps < 1 {
            return Err(RejectReason::ZeroReps);
        }
        if let Some(rpe) = self.rpe
            && !(6.0..=10.0).contains(&rpe)
        {
            return Err(RejectReason::RpeOutOfRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("no previous set to repeat or adjust; enter weight and reps")]
    NoPreviousSet,
    #[error("use: <weight> <reps> [rpe], s (same), or +5/-5 [reps] [rpe]")]
    Malformed,
    #[error("weight must be greater than zero")]
    NonPositiveWeight,
    #[error("reps must be at least 1")]
    ZeroReps,
    #[error("RPE must be between 6 and 10")]
    RpeOutOfRange,
    #[error("choose an exercise before entering sets")]
    NoActiveExercise,
}

fn parse_uint(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn parse_decimal(token: &str) -> Option<f64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    token.parse().ok()
}

/// `+5` / `-10`: sign followed by digits only
fn parse_delta(token: &str) -> Option<f64> {
    let (sign, digits) = match token.as_bytes().first()? {
        b'+' => (1.0, &token[1..]),
        b'-' => (-1.0, &token[1..]),
        _ => return None,
    };
    parse_uint(digits).map(|d| sign * d as f64)
}

/// Whether the line is shaped like set shorthand rather than an exercise name
pub fn looks_like_set(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    let Some(first) = input.split_whitespace().next() else {
        return false;
    };
    input == "s" || parse_delta(first).is_some() || parse_decimal(first).is_some()
}

/// Turn one line of input into a set, using the previous set of the same exercise as context.
///
/// RPE is only kept when `rpe_enabled`; otherwise a given third token is dropped.
pub fn parse_set_input(
    input: &str,
    last: Option<&SetEntry>,
    rpe_enabled: bool,
) -> Result<SetEntry, RejectReason> {
    let input = input.trim().to_lowercase();

    if input == "s" {
        return last.copied().ok_or(RejectReason::NoPreviousSet);
    }

    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 3 {
        return Err(RejectReason::Malformed);
    }

    let entry = if let Some(delta) = parse_delta(tokens[0]) {
        let reps = match tokens.get(1) {
            Some(t) => Some(parse_uint(t).ok_or(RejectReason::Malformed)?),
            None => None,
        };
        let rpe = match tokens.get(2) {
            Some(t) => Some(parse_decimal(t).ok_or(RejectReason::Malformed)?),
            None => None,
        };
        let last = last.ok_or(RejectReason::NoPreviousSet)?;
        SetEntry {
            weight: last.weight + delta,
            reps: reps.unwrap_or(last.reps),
            rpe: rpe.filter(|_| rpe_enabled),
        }
    } else {
        if tokens.len() < 2 {
            return Err(RejectReason::Malformed);
        }
        let weight = parse_decimal(tokens[0]).ok_or(RejectReason::Malformed)?;
        let reps = parse_uint(tokens[1]).ok_or(RejectReason::Malformed)?;
        let rpe = match tokens.get(2) {
            Some(t) => Some(parse_decimal(t).ok_or(RejectReason::Malformed)?),
            None => None,
        };
        SetEntry {
            weight,
            reps,
            rpe: rpe.filter(|_| rpe_enabled),
        }
    };

    entry.check()?;
    Ok(entry)
}
