//! Daily Plan Selector
//!
//! Serves "today's" plan for a user:
//! - an existing plan for the date is returned unchanged
//! - otherwise the split day at (plans created so far) mod (split length) is
//!   substituted, progressed and stored as the plan for that date
//!
//! Key principles:
//! - At most one plan per user per calendar date
//! - Rotation follows plan count, not the calendar, so gaps never skip a day
//! - No program means no plan; generation is never triggered implicitly

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::db::AppState;
use crate::models::{DayPlan, ExerciseSlot, LogEntry};
use crate::progression::apply_progression;
use crate::store::{self, read_db_timestamp, to_db_timestamp};
use crate::substitution::apply_substitutions;

// ---------------------------------------------------------------------------
/// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum PlanError {
    #[error("No program initialized")]
    NotInitialized,

    #[error("Workout not found: {0}")]
    PlanNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),
}

// ---------------------------------------------------------------------------
/// Planner State: What a "today" request will do
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerState {
    /// No program yet; today's plan is an error
    NoTemplate,
    /// Program exists, today's plan not materialized yet
    TemplateReady,
    /// Today's plan exists and will be returned as-is
    PlanReadyToday,
}

impl std::fmt::Display for PlannerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTemplate => write!(f, "no_template"),
            Self::TemplateReady => write!(f, "template_ready"),
            Self::PlanReadyToday => write!(f, "plan_ready_today"),
        }
    }
}

pub async fn planner_state(
    pool: &SqlitePool,
    user_id: &str,
    date: NaiveDate,
) -> Result<PlannerState, PlanError> {
    if load_plan_for_date(pool, user_id, date).await?.is_some() {
        return Ok(PlannerState::PlanReadyToday);
    }
    match store::load_active_program(pool, user_id)
        .await
        .map_err(PlanError::Database)?
    {
        Some(_) => Ok(PlannerState::TemplateReady),
        None => Ok(PlannerState::NoTemplate),
    }
}

// ---------------------------------------------------------------------------
/// Plan Selection
// ---------------------------------------------------------------------------

/// Return the user's plan for `date`, materializing it on first request
pub async fn get_or_create_plan(
    state: &AppState,
    user_id: &str,
    date: NaiveDate,
) -> Result<DayPlan, PlanError> {
    let pool = &state.db;

    if let Some(plan) = load_plan_for_date(pool, user_id, date).await? {
        tracing::debug!(user_id, %date, plan_id = plan.id, "returning existing plan");
        return Ok(plan);
    }

    // Serialize materialization per user
    let lock = state.user_lock(user_id).await;
    let result = {
        let _guard = lock.lock().await;
        materialize_plan(state, user_id, date).await
    };
    drop(lock);
    state.release_user_lock(user_id).await;
    result
}

/// Build and store the plan for `date`. Caller holds the user's lock.
async fn materialize_plan(
    state: &AppState,
    user_id: &str,
    date: NaiveDate,
) -> Result<DayPlan, PlanError> {
    let pool = &state.db;

    if let Some(plan) = load_plan_for_date(pool, user_id, date).await? {
        return Ok(plan);
    }

    let program = store::load_active_program(pool, user_id)
        .await
        .map_err(PlanError::Database)?
        .ok_or(PlanError::NotInitialized)?;

    let plans_created = count_plans(pool, user_id).await?;
    let (day_index, template) = program
        .split
        .day_for_rotation(plans_created)
        .ok_or(PlanError::NotInitialized)?;

    let preferences = store::load_preferences(pool, user_id)
        .await
        .map_err(PlanError::Database)?;
    let overlaid = apply_substitutions(&template.exercises, &preferences.substitutions);

    let history = load_history_for(pool, user_id, &overlaid).await?;
    let exercises = apply_progression(&overlaid, &history, state.config.progression_rule);

    let inserted = insert_plan_if_absent(
        pool,
        user_id,
        date,
        day_index as i64,
        &template.name,
        &exercises,
    )
    .await?;

    if inserted {
        tracing::info!(
            user_id,
            %date,
            rotation_index = day_index,
            day = %template.name,
            "materialized day plan"
        );
    } else {
        tracing::warn!(user_id, %date, "plan created concurrently, returning stored plan");
    }

    load_plan_for_date(pool, user_id, date)
        .await?
        .ok_or_else(|| PlanError::Database(format!("Plan for {} missing after insert", date)))
}

/// Logs for every distinct exercise in the plan
async fn load_history_for(
    pool: &SqlitePool,
    user_id: &str,
    slots: &[ExerciseSlot],
) -> Result<Vec<LogEntry>, PlanError> {
    let mut seen: Vec<&str> = Vec::new();
    let mut history = Vec::new();
    for slot in slots {
        if seen.contains(&slot.exercise_id.as_str()) {
            continue;
        }
        seen.push(&slot.exercise_id);
        let logs = store::load_exercise_logs(pool, user_id, &slot.exercise_id)
            .await
            .map_err(PlanError::Database)?;
        history.extend(logs);
    }
    Ok(history)
}

// ---------------------------------------------------------------------------
// Database Operations
// ---------------------------------------------------------------------------

const PLAN_COLUMNS: &str =
    "id, user_id, plan_date, day_index, day_name, plan_json, started_at, finished_at";

fn plan_from_row(row: &SqliteRow) -> Result<DayPlan, PlanError> {
    let plan_date: String = row.get("plan_date");
    let plan_json: String = row.get("plan_json");
    let started_at: Option<String> = row.get("started_at");
    let finished_at: Option<String> = row.get("finished_at");

    Ok(DayPlan {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_date: plan_date
            .parse()
            .map_err(|e| PlanError::Database(format!("Bad plan date {}: {}", plan_date, e)))?,
        day_index: row.get("day_index"),
        day_name: row.get("day_name"),
        exercises: serde_json::from_str(&plan_json)
            .map_err(|e| PlanError::Database(format!("Failed to parse plan: {}", e)))?,
        started_at: started_at
            .map(|s| read_db_timestamp("started_at", &s))
            .transpose()
            .map_err(PlanError::Database)?,
        finished_at: finished_at
            .map(|s| read_db_timestamp("finished_at", &s))
            .transpose()
            .map_err(PlanError::Database)?,
    })
}

/// Number of plans ever materialized for a user
pub async fn count_plans(pool: &SqlitePool, user_id: &str) -> Result<i64, PlanError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM workouts WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| PlanError::Database(format!("Failed to count plans: {}", e)))
}

pub async fn load_plan_for_date(
    pool: &SqlitePool,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<DayPlan>, PlanError> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM workouts WHERE user_id = ?1 AND plan_date = ?2",
        PLAN_COLUMNS
    ))
    .bind(user_id)
    .bind(date.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| PlanError::Database(format!("Failed to load plan: {}", e)))?;

    row.as_ref().map(plan_from_row).transpose()
}

/// Load a plan by id, only if it belongs to the user
pub async fn load_plan(
    pool: &SqlitePool,
    user_id: &str,
    plan_id: i64,
) -> Result<DayPlan, PlanError> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM workouts WHERE user_id = ?1 AND id = ?2",
        PLAN_COLUMNS
    ))
    .bind(user_id)
    .bind(plan_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| PlanError::Database(format!("Failed to load plan: {}", e)))?;

    match row {
        Some(row) => plan_from_row(&row),
        None => Err(PlanError::PlanNotFound(plan_id)),
    }
}

/// Insert a plan unless one already exists for (user, date).
/// Returns false when another writer got there first.
pub async fn insert_plan_if_absent(
    pool: &SqlitePool,
    user_id: &str,
    date: NaiveDate,
    day_index: i64,
    day_name: &str,
    exercises: &[ExerciseSlot],
) -> Result<bool, PlanError> {
    let plan_json = serde_json::to_string(exercises)
        .map_err(|e| PlanError::Database(format!("Failed to serialize plan: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO workouts (user_id, plan_date, day_index, day_name, plan_json, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(user_id, plan_date) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(date.to_string())
    .bind(day_index)
    .bind(day_name)
    .bind(&plan_json)
    .bind(to_db_timestamp(Utc::now()))
    .execute(pool)
    .await
    .map_err(|e| PlanError::Database(format!("Failed to save plan: {}", e)))?;

    Ok(result.rows_affected() == 1)
}

/// Stamp the first-log time; later calls leave it alone
pub async fn mark_started(
    pool: &SqlitePool,
    plan_id: i64,
    at: DateTime<Utc>,
) -> Result<(), PlanError> {
    sqlx::query("UPDATE workouts SET started_at = ?1 WHERE id = ?2 AND started_at IS NULL")
        .bind(to_db_timestamp(at))
        .bind(plan_id)
        .execute(pool)
        .await
        .map_err(|e| PlanError::Database(format!("Failed to start workout: {}", e)))?;
    Ok(())
}

pub async fn mark_finished(
    pool: &SqlitePool,
    plan_id: i64,
    at: DateTime<Utc>,
) -> Result<(), PlanError> {
    sqlx::query("UPDATE workouts SET finished_at = ?1 WHERE id = ?2")
        .bind(to_db_timestamp(at))
        .bind(plan_id)
        .execute(pool)
        .await
        .map_err(|e| PlanError::Database(format!("Failed to finish workout: {}", e)))?;
    Ok(())
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
