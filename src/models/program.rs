use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User intake used to generate a program. Only the derived profile is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intake {
  #[serde(default)]
  pub goal: Option<String>,
  #[serde(default)]
  pub experience: Option<String>,
  #[serde(default)]
  pub equipment: Vec<String>,
  #[serde(default)]
  pub training_days_per_week: Option<i64>,
  /// Known working weights keyed by lift name (`bench`, `squat`) or exercise id
  #[serde(default)]
  pub lifts: Option<HashMap<String, f64>>,
}

/// One exercise's prescription within a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSlot {
  #[serde(rename = "id")]
  pub exercise_id: String,
  pub sets: u32,
  /// Either a range ("8-10") or a literal per-set sequence ("8,8,8")
  pub reps: String,
  #[serde(rename = "target_weight", default)]
  pub target_load_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTemplate {
  #[serde(rename = "day")]
  pub name: String,
  pub exercises: Vec<ExerciseSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
  PushPullLegs,
  UpperLower,
  FullBody,
}

impl SplitKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      SplitKind::PushPullLegs => "push_pull_legs",
      SplitKind::UpperLower => "upper_lower",
      SplitKind::FullBody => "full_body",
    }
  }
}

impl std::fmt::Display for SplitKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for SplitKind {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "push_pull_legs" => Ok(Self::PushPullLegs),
      "upper_lower" => Ok(Self::UpperLower),
      "full_body" => Ok(Self::FullBody),
      _ => Err(format!("Unknown split: {}", s)),
    }
  }
}

/// Ordered day templates. Rotation is positional, never by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
  pub split: SplitKind,
  pub days: Vec<DayTemplate>,
}

impl Split {
  pub fn len(&self) -> usize {
    self.days.len()
  }

  pub fn is_empty(&self) -> bool {
    self.days.is_empty()
  }

  /// Day template for the given number of previously materialized plans
  pub fn day_for_rotation(&self, plans_created: i64) -> Option<(usize, &DayTemplate)> {
    if self.days.is_empty() {
      return None;
    }
    let index = plans_created.rem_euclid(self.days.len() as i64) as usize;
    self.days.get(index).map(|day| (index, day))
  }
}

/// A user's persisted, active program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
  pub id: i64,
  pub user_id: String,
  pub split: Split,
  pub created_at: DateTime<Utc>,
}
