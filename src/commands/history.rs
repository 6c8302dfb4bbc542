use super::require_user;
use crate::db::AppState;
use crate::models::{ExerciseHistory, HistoryPoint};
use crate::planner::PlanError;
use crate::store;

/// Chronological load series for one exercise.
/// Each point uses the actual load, else the prescribed one, else zero.
pub async fn get_history(
  state: &AppState,
  user_id: &str,
  exercise_id: &str,
) -> Result<ExerciseHistory, PlanError> {
  require_user(user_id)?;

  let logs = store::load_exercise_logs(&state.db, user_id, exercise_id)
    .await
    .map_err(PlanError::Database)?;

  let data = logs
    .iter()
    .map(|log| HistoryPoint {
      date: log.logged_at.date_naive(),
      weight: log.effective_weight().unwrap_or(0.0),
    })
    .collect();

  Ok(ExerciseHistory {
    exercise: exercise_id.to_string(),
    data,
  })
}
