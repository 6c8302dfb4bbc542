//! Load Progression Engine
//!
//! Adjusts the prescribed load of each exercise slot from the user's log history:
//! - look at the most recent completed log for the same exercise id
//! - if that session counts as a full completion, add a fixed 2.5 kg step
//! - otherwise leave the load alone
//!
//! Key principles:
//! - Loads only ever go up, and only by one step per plan
//! - Missing history or missing baseline means "hold", never an error

use serde::{Deserialize, Serialize};

use crate::models::{ExerciseSlot, LogEntry};

/// Fixed load step applied after a fully completed session
pub const LOAD_INCREMENT_KG: f64 = 2.5;

/// Minimum share of successful sets for the set-ratio rule
pub const SET_RATIO_THRESHOLD: f64 = 0.9;

// ---------------------------------------------------------------------------
/// Progression Rule: What counts as a successful session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ProgressionRule {
    /// Every listed set has a positive rep count
    #[default]
    FullCompletion,
    /// At least 90% of listed sets have a positive rep count
    SetRatio,
}

impl std::fmt::Display for ProgressionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullCompletion => write!(f, "full_completion"),
            Self::SetRatio => write!(f, "set_ratio"),
        }
    }
}

impl std::str::FromStr for ProgressionRule {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_completion" => Ok(Self::FullCompletion),
            "set_ratio" => Ok(Self::SetRatio),
            _ => Err(format!("Unknown progression rule: {}", s)),
        }
    }
}

impl ProgressionRule {
    /// Check whether a completed log earns a load increase
    pub fn qualifies(&self, log: &LogEntry) -> bool {
        let outcomes = rep_outcomes(log.reps.as_deref());
        if outcomes.is_empty() {
            // Nothing recorded per set: trust the completed flag
            return log.completed;
        }
        if !log.completed {
            return false;
        }

        let successful = outcomes.iter().filter(|rep| is_positive_rep(rep)).count();
        match self {
            Self::FullCompletion => successful == outcomes.len(),
            Self::SetRatio => successful as f64 / outcomes.len() as f64 >= SET_RATIO_THRESHOLD,
        }
    }
}

/// Split a rep string on commas, dropping blank segments
fn rep_outcomes(reps: Option<&str>) -> Vec<&str> {
    reps.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Digits only, not all zeros. Any length counts.
fn is_positive_rep(part: &str) -> bool {
    part.chars().all(|c| c.is_ascii_digit()) && part.chars().any(|c| c != '0')
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
/// Progression Decision: Why a slot did or did not move
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ProgressionDecision {
    /// No completed log for this exercise yet
    NoHistory,
    /// Last completed session fell short of the rule
    Hold,
    /// Qualified, but neither the slot nor the log carries a load
    NoBaseline,
    Progressed { from_kg: f64, to_kg: f64 },
}

/// Most recent completed log for an exercise. Ties on time go to the later insert.
pub fn latest_completed_log<'a>(exercise_id: &str, history: &'a [LogEntry]) -> Option<&'a LogEntry> {
    history
        .iter()
        .filter(|log| log.completed && log.exercise_id == exercise_id)
        .max_by_key(|log| (log.logged_at, log.id))
}

/// Adjust one slot against the user's history. Never decreases the load.
pub fn progress_slot(
    slot: &ExerciseSlot,
    history: &[LogEntry],
    rule: ProgressionRule,
) -> (ExerciseSlot, ProgressionDecision) {
    let Some(last) = latest_completed_log(&slot.exercise_id, history) else {
        return (slot.clone(), ProgressionDecision::NoHistory);
    };

    if !rule.qualifies(last) {
        return (slot.clone(), ProgressionDecision::Hold);
    }

    let Some(baseline) = slot.target_load_kg.or_else(|| last.effective_weight()) else {
        return (slot.clone(), ProgressionDecision::NoBaseline);
    };

    let next = round_one_decimal(baseline + LOAD_INCREMENT_KG);
    let progressed = ExerciseSlot {
        target_load_kg: Some(next),
        ..slot.clone()
    };
    (
        progressed,
        ProgressionDecision::Progressed {
            from_kg: baseline,
            to_kg: next,
        },
    )
}

/// Progress every slot of a day plan
pub fn apply_progression(
    slots: &[ExerciseSlot],
    history: &[LogEntry],
    rule: ProgressionRule,
) -> Vec<ExerciseSlot> {
    slots
        .iter()
        .map(|slot| {
            let (progressed, decision) = progress_slot(slot, history, rule);
            if let ProgressionDecision::Progressed { from_kg, to_kg } = decision {
                tracing::debug!(
                    exercise = %slot.exercise_id,
                    from_kg,
                    to_kg,
                    "progressed target load"
                );
            }
            progressed
        })
        .collect()
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
