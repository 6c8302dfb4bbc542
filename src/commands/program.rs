//! Program initialization and planner status

use chrono::Utc;

use super::require_user;
use crate::db::AppState;
use crate::models::{Intake, Program, UserProfile};
use crate::planner::{planner_state, PlanError, PlannerState};
use crate::store;
use crate::templates::generate_split;

/// Generate a split from intake and make it the user's active program.
/// Also refreshes the stored profile.
pub async fn init_program(
  state: &AppState,
  user_id: &str,
  intake: &Intake,
) -> Result<Program, PlanError> {
  require_user(user_id)?;

  let profile = UserProfile::from_intake(user_id, intake);
  store::upsert_profile(&state.db, &profile)
    .await
    .map_err(PlanError::Database)?;

  let split = generate_split(intake);
  let program = store::save_program(&state.db, user_id, &split)
    .await
    .map_err(PlanError::Database)?;

  tracing::info!(
    user_id,
    split = %program.split.split,
    days = program.split.len(),
    "program initialized"
  );

  Ok(program)
}

/// Where the user stands for today
pub async fn get_planner_state(state: &AppState, user_id: &str) -> Result<PlannerState, PlanError> {
  require_user(user_id)?;
  planner_state(&state.db, user_id, Utc::now().date_naive()).await
}
