pub mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod planner;
pub mod progression;
pub mod report;
pub mod store;
pub mod substitution;
pub mod templates;

#[cfg(test)]
mod test_utils;

use config::AppConfig;
use db::AppState;
use tracing_subscriber::EnvFilter;

pub use planner::{PlanError, PlannerState};

/// Install the fmt subscriber. `RUST_LOG` wins over `default_level`.
/// Safe to call more than once.
pub fn init_tracing(default_level: &str) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build application state from configuration: logging, pool, migrations
pub async fn initialize(config: AppConfig) -> Result<AppState, sqlx::Error> {
  init_tracing(&config.log_level);

  let pool = db::initialize_db(&config.database_url, config.max_connections).await?;
  tracing::info!(rule = %config.progression_rule, "planner ready");

  Ok(AppState::new(pool, config))
}
