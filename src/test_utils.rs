//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Helper assertions

use crate::config::AppConfig;
use crate::db::AppState;
use crate::models::{Intake, NewLogEntry};
use crate::store::to_db_timestamp;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  crate::db::initialize_db("sqlite::memory:", 1)
    .await
    .expect("Failed to create in-memory database")
}

/// Application state over a fresh in-memory database with default config
pub async fn setup_test_state() -> AppState {
  AppState::new(setup_test_db().await, AppConfig::default())
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Insert a bare workout row for a date and return its id
pub async fn seed_test_workout(pool: &SqlitePool, user_id: &str, date: NaiveDate) -> i64 {
  let result = sqlx::query(
    r#"
    INSERT INTO workouts (user_id, plan_date, day_index, day_name, plan_json, created_at)
    VALUES (?1, ?2, 0, 'Full Body', '[]', ?3)
    "#,
  )
  .bind(user_id)
  .bind(date.to_string())
  .bind(to_db_timestamp(Utc::now()))
  .execute(pool)
  .await
  .expect("Failed to insert test workout");

  result.last_insert_rowid()
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Intake with no known lifts
pub fn mock_intake(training_days_per_week: Option<i64>) -> Intake {
  Intake {
    goal: Some("hypertrophy".to_string()),
    experience: Some("intermediate".to_string()),
    equipment: vec!["barbell".to_string(), "dumbbells".to_string()],
    training_days_per_week,
    lifts: None,
  }
}

/// Intake with known working weights
pub fn mock_intake_with_lifts(training_days_per_week: i64, lifts: &[(&str, f64)]) -> Intake {
  Intake {
    lifts: Some(
      lifts
        .iter()
        .map(|(name, kg)| (name.to_string(), *kg))
        .collect::<HashMap<_, _>>(),
    ),
    ..mock_intake(Some(training_days_per_week))
  }
}

/// Completed three-set log
pub fn mock_new_log(workout_id: i64, exercise_id: &str, actual_weight: Option<f64>, reps: &str) -> NewLogEntry {
  NewLogEntry {
    workout_id,
    exercise_id: exercise_id.to_string(),
    actual_weight,
    target_weight: actual_weight,
    sets: Some(reps.split(',').count() as i64),
    reps: Some(reps.to_string()),
    completed: true,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('programs', 'workouts', 'workout_logs', 'user_preferences', 'user_profiles')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_workout_returns_distinct_ids() {
    let pool = setup_test_db().await;
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let first = seed_test_workout(&pool, "user-1", day).await;
    let second = seed_test_workout(&pool, "user-1", day.succ_opt().unwrap()).await;
    assert_ne!(first, second);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let intake = mock_intake_with_lifts(5, &[("bench", 80.0)]);
    assert_eq!(intake.training_days_per_week, Some(5));
    assert_eq!(intake.lifts.unwrap().get("bench"), Some(&80.0));

    let log = mock_new_log(1, "bench_press", Some(60.0), "8,8,8");
    assert_eq!(log.sets, Some(3));
    assert!(log.completed);
  }
}
