//! Template generation from intake
//!
//! Maps weekly training frequency to a split and its ordered day templates.
//! Initial loads come from the user's known lifts when one matches,
//! otherwise from the default-load table below.

use std::collections::HashMap;

use crate::models::{DayTemplate, ExerciseSlot, Intake, Split, SplitKind};

/// ---------------------------------------------------------------------------
/// Default-Load Table
/// ---------------------------------------------------------------------------

/// Fixed prescription used when intake has no matching known lift
#[derive(Debug, Clone, Copy)]
pub struct SlotDefault {
  pub exercise_id: &'static str,
  /// Short lift name accepted in intake (e.g. "bench" for bench_press)
  pub lift_alias: Option<&'static str>,
  pub sets: u32,
  pub reps: &'static str,
  pub default_load_kg: f64,
}

const fn slot(
  exercise_id: &'static str,
  lift_alias: Option<&'static str>,
  reps: &'static str,
  default_load_kg: f64,
) -> SlotDefault {
  SlotDefault {
    exercise_id,
    lift_alias,
    sets: 3,
    reps,
    default_load_kg,
  }
}

const PUSH: &[SlotDefault] = &[
  slot("bench_press", Some("bench"), "8-10", 60.0),
  slot("overhead_press", None, "8-10", 40.0),
];

const PULL: &[SlotDefault] = &[
  slot("barbell_row", None, "8-10", 50.0),
  slot("lat_pulldown", None, "10-12", 45.0),
];

const LEGS: &[SlotDefault] = &[
  slot("back_squat", Some("squat"), "8-10", 70.0),
  slot("romanian_deadlift", None, "10-12", 60.0),
];

const UPPER: &[SlotDefault] = &[
  slot("bench_press", Some("bench"), "8-10", 60.0),
  slot("barbell_row", None, "8-10", 50.0),
];

// Four-day lifters get heavier lower-body defaults
const LOWER: &[SlotDefault] = &[
  slot("back_squat", Some("squat"), "8-10", 80.0),
  slot("romanian_deadlift", None, "10-12", 70.0),
];

const FULL_BODY: &[SlotDefault] = &[
  slot("goblet_squat", None, "12", 24.0),
  slot("dumbbell_press", None, "10", 20.0),
  slot("dumbbell_row", None, "10", 24.0),
];

/// Day names and blueprints for a split, in rotation order
pub fn split_blueprint(kind: SplitKind) -> &'static [(&'static str, &'static [SlotDefault])] {
  match kind {
    SplitKind::PushPullLegs => &[("Push", PUSH), ("Pull", PULL), ("Legs", LEGS)],
    SplitKind::UpperLower => &[("Upper", UPPER), ("Lower", LOWER)],
    SplitKind::FullBody => &[("Full Body", FULL_BODY)],
  }
}

/// ---------------------------------------------------------------------------
/// Generation
/// ---------------------------------------------------------------------------

/// Branch on weekly frequency. Missing or nonsensical values land on full body.
pub fn split_for_frequency(training_days_per_week: Option<i64>) -> SplitKind {
  match training_days_per_week {
    Some(days) if days >= 5 => SplitKind::PushPullLegs,
    Some(4) => SplitKind::UpperLower,
    _ => SplitKind::FullBody,
  }
}

/// Generate the split for an intake. Pure; the caller persists the result.
pub fn generate_split(intake: &Intake) -> Split {
  let kind = split_for_frequency(intake.training_days_per_week);
  let empty = HashMap::new();
  let lifts = intake.lifts.as_ref().unwrap_or(&empty);

  let days = split_blueprint(kind)
    .iter()
    .map(|(name, slots)| DayTemplate {
      name: name.to_string(),
      exercises: slots.iter().map(|s| build_slot(s, lifts)).collect(),
    })
    .collect();

  Split { split: kind, days }
}

fn build_slot(default: &SlotDefault, lifts: &HashMap<String, f64>) -> ExerciseSlot {
  let known = lifts
    .get(default.exercise_id)
    .or_else(|| default.lift_alias.and_then(|alias| lifts.get(alias)))
    .copied()
    .filter(|w| w.is_finite() && *w >= 0.0);

  ExerciseSlot {
    exercise_id: default.exercise_id.to_string(),
    sets: default.sets,
    reps: default.reps.to_string(),
    target_load_kg: Some(known.unwrap_or(default.default_load_kg)),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
