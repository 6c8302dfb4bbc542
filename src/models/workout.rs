use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ExerciseSlot;

/// Materialized plan for one user on one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
  pub id: i64,
  pub user_id: String,
  pub plan_date: NaiveDate,
  /// Position in the split this plan was built from
  pub day_index: i64,
  pub day_name: String,
  pub exercises: Vec<ExerciseSlot>,
  pub started_at: Option<DateTime<Utc>>,
  pub finished_at: Option<DateTime<Utc>>,
}

/// One logged exercise (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
  pub id: i64,
  pub user_id: String,
  pub workout_id: i64,
  pub exercise_id: String,
  pub actual_weight: Option<f64>,
  pub target_weight: Option<f64>,
  pub sets: Option<i64>,
  /// Per-set rep outcome, e.g. "8,8,7"
  pub reps: Option<String>,
  pub completed: bool,
  pub logged_at: DateTime<Utc>,
}

impl LogEntry {
  /// Actual load if logged, otherwise the prescribed load
  pub fn effective_weight(&self) -> Option<f64> {
    self.actual_weight.or(self.target_weight)
  }
}

/// For appending a log (without id, user, logged_at)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLogEntry {
  pub workout_id: i64,
  pub exercise_id: String,
  #[serde(default)]
  pub actual_weight: Option<f64>,
  #[serde(default)]
  pub target_weight: Option<f64>,
  #[serde(default)]
  pub sets: Option<i64>,
  #[serde(default)]
  pub reps: Option<String>,
  #[serde(default = "default_completed")]
  pub completed: bool,
}

fn default_completed() -> bool {
  true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishSummary {
  pub message: String,
  /// Signed per-exercise deltas ("+2.5kg"); None when nothing could be compared
  pub progress: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
  pub date: NaiveDate,
  pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseHistory {
  pub exercise: String,
  pub data: Vec<HistoryPoint>,
}
