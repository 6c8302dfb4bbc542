//! Preference overlay: swap exercise ids using the user's substitution table

use crate::models::{ExerciseSlot, SubstitutionTable};

/// Replace identifiers that have a saved substitution.
/// Sets, reps and load pass through untouched.
pub fn apply_substitutions(slots: &[ExerciseSlot], table: &SubstitutionTable) -> Vec<ExerciseSlot> {
  slots
    .iter()
    .map(|slot| match table.get(&slot.exercise_id) {
      Some(replacement) => ExerciseSlot {
        exercise_id: replacement.clone(),
        ..slot.clone()
      },
      None => slot.clone(),
    })
    .collect()
}
