//! Caller-facing operations
//!
//! Every command takes the application state and an already-resolved user id.
//! Identity is never derived here.

pub mod history;
pub mod program;
pub mod workout;

use crate::planner::PlanError;

/// Reject blank user ids before touching storage
pub(crate) fn require_user(user_id: &str) -> Result<(), PlanError> {
  if user_id.trim().is_empty() {
    return Err(PlanError::InvalidInput("user id is required".to_string()));
  }
  Ok(())
}
