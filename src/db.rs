use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
  /// One lock per user guarding plan materialization and preference edits.
  /// Entries are dropped by `release_user_lock` once no caller holds them.
  user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
  pub fn new(db: DbPool, config: AppConfig) -> Self {
    Self {
      db,
      config,
      user_locks: Mutex::new(HashMap::new()),
    }
  }

  /// Lock serializing read-modify-write work for one user
  pub async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
    let mut locks = self.user_locks.lock().await;
    locks
      .entry(user_id.to_string())
      .or_insert_with(|| Arc::new(Mutex::new(())))
      .clone()
  }

  /// Forget a user's lock when the map holds the only reference.
  /// Call after dropping both the guard and the `Arc` from `user_lock`.
  pub async fn release_user_lock(&self, user_id: &str) {
    let mut locks = self.user_locks.lock().await;
    if locks.get(user_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
      locks.remove(user_id);
    }
  }

  /// Number of users with a live lock entry
  pub async fn tracked_user_locks(&self) -> usize {
    self.user_locks.lock().await.len()
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
  tracing::info!("Initializing database at: {}", database_url);

  // Create connection pool
  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections)
    .connect(database_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}
