use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Original exercise id -> replacement exercise id. Entries never expire.
pub type SubstitutionTable = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
  pub substitutions: SubstitutionTable,
  /// Exercises the user swapped away from, sorted
  pub avoid_exercises: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
  Swap,
  #[serde(other)]
  Unsupported,
}

/// A requested edit to the served plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutChange {
  pub exercise_id: String,
  pub action: ChangeAction,
  #[serde(default)]
  pub new_exercise: Option<String>,
}

impl UserPreferences {
  /// Apply swap changes; other actions and swaps without a target are ignored.
  /// Returns how many substitutions were written.
  pub fn apply_changes(&mut self, changes: &[WorkoutChange]) -> usize {
    let mut applied = 0;
    for change in changes {
      let replacement = match (&change.action, change.new_exercise.as_deref()) {
        (ChangeAction::Swap, Some(new)) if !new.is_empty() && !change.exercise_id.is_empty() => new,
        _ => continue,
      };
      self
        .substitutions
        .insert(change.exercise_id.clone(), replacement.to_string());
      if !self.avoid_exercises.contains(&change.exercise_id) {
        self.avoid_exercises.push(change.exercise_id.clone());
      }
      applied += 1;
    }
    self.avoid_exercises.sort();
    applied
  }
}
