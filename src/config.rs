use serde::Serialize;

use crate::progression::ProgressionRule;

const DEFAULT_DATABASE_URL: &str = "sqlite://gym-partner.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ConfigError {
  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub max_connections: u32,
  pub log_level: String,
  pub progression_rule: ProgressionRule,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      max_connections: DEFAULT_MAX_CONNECTIONS,
      log_level: DEFAULT_LOG_LEVEL.to_string(),
      progression_rule: ProgressionRule::default(),
    }
  }
}

impl AppConfig {
  /// Read configuration from the process environment (and `.env` if present)
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_env_with(|k| std::env::var(k).ok())
  }

  /// Same as `from_env`, reading values through `get` so tests need not
  /// touch the global environment.
  pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigError>
  where
    F: FnMut(&str) -> Option<String>,
  {
    let database_url =
      get("GYM_PARTNER_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let max_connections = match get("GYM_PARTNER_MAX_CONNECTIONS") {
      Some(raw) => raw
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::Invalid(format!("GYM_PARTNER_MAX_CONNECTIONS={}", raw)))?,
      None => DEFAULT_MAX_CONNECTIONS,
    };

    let log_level = get("GYM_PARTNER_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let progression_rule = match get("GYM_PARTNER_PROGRESSION_RULE") {
      Some(raw) => raw.trim().parse().map_err(ConfigError::Invalid)?,
      None => ProgressionRule::default(),
    };

    Ok(Self {
      database_url,
      max_connections,
      log_level,
      progression_rule,
    })
  }
}
