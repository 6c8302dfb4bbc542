//! Today's workout: fetch, edit, log, finish

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;

use super::require_user;
use crate::db::AppState;
use crate::models::{DayPlan, FinishSummary, NewLogEntry, UserPreferences, WorkoutChange};
use crate::planner::{self, get_or_create_plan, PlanError};
use crate::report::build_progress_report;
use crate::store;

const FINISH_MESSAGE: &str = "Great work!";

/// Plan for the current UTC date
pub async fn get_today_workout(state: &AppState, user_id: &str) -> Result<DayPlan, PlanError> {
  get_workout_for_date(state, user_id, Utc::now().date_naive()).await
}

/// Plan for an explicit calendar date (callers with their own clock or timezone)
pub async fn get_workout_for_date(
  state: &AppState,
  user_id: &str,
  date: NaiveDate,
) -> Result<DayPlan, PlanError> {
  require_user(user_id)?;
  get_or_create_plan(state, user_id, date).await
}

/// Apply swap requests to the user's substitution table.
/// Takes effect from the next materialized plan.
pub async fn update_workout(
  state: &AppState,
  user_id: &str,
  changes: &[WorkoutChange],
) -> Result<UserPreferences, PlanError> {
  require_user(user_id)?;

  // Load and save under one guard so overlapping edits both land
  let lock = state.user_lock(user_id).await;
  let result = {
    let _guard = lock.lock().await;
    merge_changes(state, user_id, changes).await
  };
  drop(lock);
  state.release_user_lock(user_id).await;
  result
}

async fn merge_changes(
  state: &AppState,
  user_id: &str,
  changes: &[WorkoutChange],
) -> Result<UserPreferences, PlanError> {
  let mut preferences = store::load_preferences(&state.db, user_id)
    .await
    .map_err(PlanError::Database)?;
  let applied = preferences.apply_changes(changes);

  if applied > 0 {
    store::save_preferences(&state.db, user_id, &preferences)
      .await
      .map_err(PlanError::Database)?;
    tracing::info!(user_id, applied, "substitutions saved");
  }

  Ok(preferences)
}

fn validate_log(log: &NewLogEntry) -> Result<(), PlanError> {
  if log.exercise_id.trim().is_empty() {
    return Err(PlanError::InvalidInput("exercise id is required".to_string()));
  }
  for (field, value) in [("actual_weight", log.actual_weight), ("target_weight", log.target_weight)] {
    if let Some(kg) = value {
      if !kg.is_finite() || kg < 0.0 {
        return Err(PlanError::InvalidInput(format!("{} must be a non-negative number", field)));
      }
    }
  }
  if log.sets.is_some_and(|sets| sets < 0) {
    return Err(PlanError::InvalidInput("sets must not be negative".to_string()));
  }
  Ok(())
}

/// Append a log against one of the user's plans. Returns the log id.
pub async fn log_workout(state: &AppState, user_id: &str, log: &NewLogEntry) -> Result<i64, PlanError> {
  require_user(user_id)?;
  validate_log(log)?;

  let plan = planner::load_plan(&state.db, user_id, log.workout_id).await?;
  let now = Utc::now();

  let log_id = store::insert_log(&state.db, user_id, log, now)
    .await
    .map_err(PlanError::Database)?;
  planner::mark_started(&state.db, plan.id, now).await?;

  tracing::debug!(user_id, workout_id = plan.id, exercise = %log.exercise_id, log_id, "log appended");
  Ok(log_id)
}

/// Close out a workout and report load changes against each exercise's previous session
pub async fn finish_workout(
  state: &AppState,
  user_id: &str,
  workout_id: i64,
) -> Result<FinishSummary, PlanError> {
  require_user(user_id)?;

  let plan = planner::load_plan(&state.db, user_id, workout_id).await?;
  let today = store::load_workout_logs(&state.db, user_id, plan.id)
    .await
    .map_err(PlanError::Database)?;

  let mut prior = HashMap::new();
  for log in &today {
    if prior.contains_key(&log.exercise_id) {
      continue;
    }
    if let Some(previous) = store::latest_log_outside_workout(&state.db, user_id, &log.exercise_id, plan.id)
      .await
      .map_err(PlanError::Database)?
    {
      prior.insert(log.exercise_id.clone(), previous);
    }
  }

  planner::mark_finished(&state.db, plan.id, Utc::now()).await?;
  let progress = build_progress_report(&today, &prior);

  tracing::info!(
    user_id,
    workout_id = plan.id,
    logs = today.len(),
    compared = progress.as_ref().map_or(0, |p| p.len()),
    "workout finished"
  );

  Ok(FinishSummary {
    message: FINISH_MESSAGE.to_string(),
    progress,
  })
}
