//! Persistence for programs, profiles, preferences and exercise logs
//!
//! Day plans are owned by the planner; everything else the engine reads or
//! writes goes through here.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{LogEntry, NewLogEntry, Program, Split, UserPreferences, UserProfile};

/// ---------------------------------------------------------------------------
/// Timestamps
/// ---------------------------------------------------------------------------

/// Fixed-width RFC3339 so that text ordering in SQL matches time ordering
pub fn to_db_timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
}

/// Parse a stored timestamp column, naming the column on failure
pub fn read_db_timestamp(column: &str, s: &str) -> Result<DateTime<Utc>, String> {
  parse_db_timestamp(s).ok_or_else(|| format!("Bad {} timestamp: {:?}", column, s))
}

/// ---------------------------------------------------------------------------
/// Programs
/// ---------------------------------------------------------------------------

/// Store a newly generated split as the user's active program
pub async fn save_program(pool: &SqlitePool, user_id: &str, split: &Split) -> Result<Program, String> {
  let program_json =
    serde_json::to_string(split).map_err(|e| format!("Failed to serialize program: {}", e))?;
  let created_at = Utc::now();

  let result = sqlx::query(
    r#"
    INSERT INTO programs (user_id, split, program_json, created_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(user_id)
  .bind(split.split.as_str())
  .bind(&program_json)
  .bind(to_db_timestamp(created_at))
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to save program: {}", e))?;

  Ok(Program {
    id: result.last_insert_rowid(),
    user_id: user_id.to_string(),
    split: split.clone(),
    created_at,
  })
}

/// Latest program for a user, if any
pub async fn load_active_program(pool: &SqlitePool, user_id: &str) -> Result<Option<Program>, String> {
  let row = sqlx::query(
    r#"
    SELECT id, user_id, program_json, created_at
    FROM programs
    WHERE user_id = ?1
    ORDER BY created_at DESC, id DESC
    LIMIT 1
    "#,
  )
  .bind(user_id)
  .fetch_optional(pool)
  .await
  .map_err(|e| format!("Failed to load program: {}", e))?;

  let Some(row) = row else {
    return Ok(None);
  };

  let program_json: String = row.get("program_json");
  let split: Split =
    serde_json::from_str(&program_json).map_err(|e| format!("Failed to parse program: {}", e))?;
  let created_at: String = row.get("created_at");

  Ok(Some(Program {
    id: row.get("id"),
    user_id: row.get("user_id"),
    split,
    created_at: read_db_timestamp("created_at", &created_at)?,
  }))
}

/// ---------------------------------------------------------------------------
/// Profiles
/// ---------------------------------------------------------------------------

/// Insert or overwrite the user's profile
pub async fn upsert_profile(pool: &SqlitePool, profile: &UserProfile) -> Result<(), String> {
  let equipment_json = serde_json::to_string(&profile.equipment)
    .map_err(|e| format!("Failed to serialize equipment: {}", e))?;
  let lifts_json = serde_json::to_string(&profile.known_lifts)
    .map_err(|e| format!("Failed to serialize lifts: {}", e))?;

  sqlx::query(
    r#"
    INSERT INTO user_profiles (
      user_id, goal, experience, equipment_json,
      training_days_per_week, known_lifts_json, updated_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(user_id) DO UPDATE SET
      goal = excluded.goal,
      experience = excluded.experience,
      equipment_json = excluded.equipment_json,
      training_days_per_week = excluded.training_days_per_week,
      known_lifts_json = excluded.known_lifts_json,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(&profile.user_id)
  .bind(&profile.goal)
  .bind(&profile.experience)
  .bind(&equipment_json)
  .bind(profile.training_days_per_week)
  .bind(&lifts_json)
  .bind(to_db_timestamp(Utc::now()))
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to save profile: {}", e))?;

  Ok(())
}

pub async fn load_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>, String> {
  let row = sqlx::query(
    r#"
    SELECT user_id, goal, experience, equipment_json, training_days_per_week, known_lifts_json
    FROM user_profiles
    WHERE user_id = ?1
    "#,
  )
  .bind(user_id)
  .fetch_optional(pool)
  .await
  .map_err(|e| format!("Failed to load profile: {}", e))?;

  let Some(row) = row else {
    return Ok(None);
  };

  let equipment_json: String = row.get("equipment_json");
  let lifts_json: String = row.get("known_lifts_json");

  Ok(Some(UserProfile {
    user_id: row.get("user_id"),
    goal: row.get("goal"),
    experience: row.get("experience"),
    equipment: serde_json::from_str(&equipment_json)
      .map_err(|e| format!("Failed to parse equipment: {}", e))?,
    training_days_per_week: row.get("training_days_per_week"),
    known_lifts: serde_json::from_str(&lifts_json)
      .map_err(|e| format!("Failed to parse known lifts: {}", e))?,
  }))
}

/// ---------------------------------------------------------------------------
/// Preferences
/// ---------------------------------------------------------------------------

/// Saved preferences, or empty ones for a user who never swapped anything
pub async fn load_preferences(pool: &SqlitePool, user_id: &str) -> Result<UserPreferences, String> {
  let row: Option<(String, String)> = sqlx::query_as(
    "SELECT substitutions_json, avoid_exercises_json FROM user_preferences WHERE user_id = ?1",
  )
  .bind(user_id)
  .fetch_optional(pool)
  .await
  .map_err(|e| format!("Failed to load preferences: {}", e))?;

  match row {
    Some((substitutions_json, avoid_json)) => Ok(UserPreferences {
      substitutions: serde_json::from_str(&substitutions_json)
        .map_err(|e| format!("Failed to parse substitutions: {}", e))?,
      avoid_exercises: serde_json::from_str(&avoid_json)
        .map_err(|e| format!("Failed to parse avoided exercises: {}", e))?,
    }),
    None => Ok(UserPreferences::default()),
  }
}

pub async fn save_preferences(
  pool: &SqlitePool,
  user_id: &str,
  preferences: &UserPreferences,
) -> Result<(), String> {
  let substitutions_json = serde_json::to_string(&preferences.substitutions)
    .map_err(|e| format!("Failed to serialize substitutions: {}", e))?;
  let avoid_json = serde_json::to_string(&preferences.avoid_exercises)
    .map_err(|e| format!("Failed to serialize avoided exercises: {}", e))?;

  sqlx::query(
    r#"
    INSERT INTO user_preferences (user_id, substitutions_json, avoid_exercises_json, updated_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(user_id) DO UPDATE SET
      substitutions_json = excluded.substitutions_json,
      avoid_exercises_json = excluded.avoid_exercises_json,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(user_id)
  .bind(&substitutions_json)
  .bind(&avoid_json)
  .bind(to_db_timestamp(Utc::now()))
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to save preferences: {}", e))?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Exercise Logs
/// ---------------------------------------------------------------------------

const LOG_COLUMNS: &str = "id, user_id, workout_id, exercise_id, actual_weight, target_weight, \
                           sets, reps, completed, logged_at";

fn log_from_row(row: &SqliteRow) -> Result<LogEntry, String> {
  let logged_at: String = row.get("logged_at");
  Ok(LogEntry {
    id: row.get("id"),
    user_id: row.get("user_id"),
    workout_id: row.get("workout_id"),
    exercise_id: row.get("exercise_id"),
    actual_weight: row.get("actual_weight"),
    target_weight: row.get("target_weight"),
    sets: row.get("sets"),
    reps: row.get("reps"),
    completed: row.get("completed"),
    logged_at: read_db_timestamp("logged_at", &logged_at)?,
  })
}

/// Append a log stamped with `logged_at`. Returns the new row id.
pub async fn insert_log(
  pool: &SqlitePool,
  user_id: &str,
  log: &NewLogEntry,
  logged_at: DateTime<Utc>,
) -> Result<i64, String> {
  let result = sqlx::query(
    r#"
    INSERT INTO workout_logs (
      user_id, workout_id, exercise_id, actual_weight, target_weight,
      sets, reps, completed, logged_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    "#,
  )
  .bind(user_id)
  .bind(log.workout_id)
  .bind(&log.exercise_id)
  .bind(log.actual_weight)
  .bind(log.target_weight)
  .bind(log.sets)
  .bind(&log.reps)
  .bind(log.completed)
  .bind(to_db_timestamp(logged_at))
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to insert log: {}", e))?;

  Ok(result.last_insert_rowid())
}

/// All logs for one exercise, oldest first
pub async fn load_exercise_logs(
  pool: &SqlitePool,
  user_id: &str,
  exercise_id: &str,
) -> Result<Vec<LogEntry>, String> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM workout_logs WHERE user_id = ?1 AND exercise_id = ?2 ORDER BY logged_at, id",
    LOG_COLUMNS
  ))
  .bind(user_id)
  .bind(exercise_id)
  .fetch_all(pool)
  .await
  .map_err(|e| format!("Failed to load exercise logs: {}", e))?;

  rows.iter().map(log_from_row).collect()
}

/// Logs recorded against one workout, oldest first
pub async fn load_workout_logs(
  pool: &SqlitePool,
  user_id: &str,
  workout_id: i64,
) -> Result<Vec<LogEntry>, String> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM workout_logs WHERE user_id = ?1 AND workout_id = ?2 ORDER BY logged_at, id",
    LOG_COLUMNS
  ))
  .bind(user_id)
  .bind(workout_id)
  .fetch_all(pool)
  .await
  .map_err(|e| format!("Failed to load workout logs: {}", e))?;

  rows.iter().map(log_from_row).collect()
}

/// Most recent log of an exercise recorded under any other workout
pub async fn latest_log_outside_workout(
  pool: &SqlitePool,
  user_id: &str,
  exercise_id: &str,
  workout_id: i64,
) -> Result<Option<LogEntry>, String> {
  let row = sqlx::query(&format!(
    r#"
    SELECT {}
    FROM workout_logs
    WHERE user_id = ?1 AND exercise_id = ?2 AND workout_id != ?3
    ORDER BY logged_at DESC, id DESC
    LIMIT 1
    "#,
    LOG_COLUMNS
  ))
  .bind(user_id)
  .bind(exercise_id)
  .bind(workout_id)
  .fetch_optional(pool)
  .await
  .map_err(|e| format!("Failed to load previous log: {}", e))?;

  row.as_ref().map(log_from_row).transpose()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::SplitKind;
  use crate::test_utils::{datetime_days_ago, mock_intake, mock_new_log, seed_test_workout};
  use chrono::NaiveDate;

  #[test]
  fn test_timestamps_sort_as_text() {
    let earlier = Utc::now();
    let later = earlier + chrono::Duration::milliseconds(1);
    assert!(to_db_timestamp(earlier) < to_db_timestamp(later));
    let parsed = parse_db_timestamp(&to_db_timestamp(earlier)).unwrap();
    assert_eq!(parsed.timestamp_micros(), earlier.timestamp_micros());
  }

  #[tokio::test]
  async fn test_latest_program_is_active() {
    let pool = crate::test_utils::setup_test_db().await;

    assert!(load_active_program(&pool, "user-1").await.unwrap().is_none());

    let full_body = crate::templates::generate_split(&mock_intake(Some(3)));
    let ppl = crate::templates::generate_split(&mock_intake(Some(5)));
    save_program(&pool, "user-1", &full_body).await.unwrap();
    save_program(&pool, "user-1", &ppl).await.unwrap();
    save_program(&pool, "user-2", &full_body).await.unwrap();

    let active = load_active_program(&pool, "user-1").await.unwrap().unwrap();
    assert_eq!(active.split.split, SplitKind::PushPullLegs);
    assert_eq!(active.split, ppl);

    crate::test_utils::teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_profile_upsert_overwrites() {
    let pool = crate::test_utils::setup_test_db().await;

    let mut profile = UserProfile::from_intake("user-1", &mock_intake(Some(3)));
    upsert_profile(&pool, &profile).await.unwrap();

    profile.training_days_per_week = Some(5);
    profile.goal = Some("strength".to_string());
    upsert_profile(&pool, &profile).await.unwrap();

    let stored = load_profile(&pool, "user-1").await.unwrap().unwrap();
    assert_eq!(stored, profile);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_profiles")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(count, 1);

    crate::test_utils::teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_preferences_default_then_upsert() {
    let pool = crate::test_utils::setup_test_db().await;

    let empty = load_preferences(&pool, "user-1").await.unwrap();
    assert_eq!(empty, UserPreferences::default());

    let mut prefs = UserPreferences::default();
    prefs
      .substitutions
      .insert("bench_press".to_string(), "incline_press".to_string());
    prefs.avoid_exercises.push("bench_press".to_string());
    save_preferences(&pool, "user-1", &prefs).await.unwrap();

    prefs
      .substitutions
      .insert("back_squat".to_string(), "front_squat".to_string());
    save_preferences(&pool, "user-1", &prefs).await.unwrap();

    assert_eq!(load_preferences(&pool, "user-1").await.unwrap(), prefs);

    crate::test_utils::teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_damaged_rows_are_errors_not_defaults() {
    let pool = crate::test_utils::setup_test_db().await;
    let workout = seed_test_workout(&pool, "user-1", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).await;

    save_program(&pool, "user-1", &crate::templates::generate_split(&mock_intake(Some(3))))
      .await
      .unwrap();
    upsert_profile(&pool, &UserProfile::from_intake("user-1", &mock_intake(Some(3))))
      .await
      .unwrap();
    save_preferences(&pool, "user-1", &UserPreferences::default()).await.unwrap();
    insert_log(&pool, "user-1", &mock_new_log(workout, "bench_press", Some(60.0), "8,8,8"), Utc::now())
      .await
      .unwrap();

    for statement in [
      "UPDATE programs SET created_at = 'yesterday'",
      "UPDATE user_profiles SET equipment_json = '{broken'",
      "UPDATE user_preferences SET avoid_exercises_json = 'not json'",
      "UPDATE workout_logs SET logged_at = ''",
    ] {
      sqlx::query(statement).execute(&pool).await.unwrap();
    }

    let err = load_active_program(&pool, "user-1").await.unwrap_err();
    assert!(err.contains("created_at"), "{}", err);
    let err = load_profile(&pool, "user-1").await.unwrap_err();
    assert!(err.contains("equipment"), "{}", err);
    let err = load_preferences(&pool, "user-1").await.unwrap_err();
    assert!(err.contains("avoided exercises"), "{}", err);
    let err = load_exercise_logs(&pool, "user-1", "bench_press").await.unwrap_err();
    assert!(err.contains("logged_at"), "{}", err);
    assert!(load_workout_logs(&pool, "user-1", workout).await.is_err());
    assert!(latest_log_outside_workout(&pool, "user-1", "bench_press", workout + 1)
      .await
      .is_err());

    // Lifts are checked independently of equipment
    sqlx::query("UPDATE user_profiles SET equipment_json = '[]', known_lifts_json = '[1,2]'")
      .execute(&pool)
      .await
      .unwrap();
    let err = load_profile(&pool, "user-1").await.unwrap_err();
    assert!(err.contains("known lifts"), "{}", err);

    crate::test_utils::teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_latest_log_outside_workout_skips_current() {
    let pool = crate::test_utils::setup_test_db().await;
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let old = seed_test_workout(&pool, "user-1", day).await;
    let today = seed_test_workout(&pool, "user-1", day.succ_opt().unwrap()).await;

    insert_log(&pool, "user-1", &mock_new_log(old, "bench_press", Some(60.0), "8,8,8"), datetime_days_ago(1))
      .await
      .unwrap();
    insert_log(&pool, "user-1", &mock_new_log(today, "bench_press", Some(62.5), "8,8,8"), Utc::now())
      .await
      .unwrap();

    let prior = latest_log_outside_workout(&pool, "user-1", "bench_press", today)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(prior.workout_id, old);
    assert_eq!(prior.actual_weight, Some(60.0));

    assert!(latest_log_outside_workout(&pool, "user-2", "bench_press", today)
      .await
      .unwrap()
      .is_none());

    let history = load_exercise_logs(&pool, "user-1", "bench_press").await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].logged_at < history[1].logged_at);
    assert!(history[0].completed);

    crate::test_utils::teardown_test_db(pool).await;
  }
}
