//! Preference store
//!
//! Read/write user preferences from the settings table (key-value store).
//! Missing keys are seeded with their defaults on first read.

use crate::error::Result;
use harmonia_common::PlayMode;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

const PLAY_MODE_KEY: &str = "play_mode";
const USER_NAME_KEY: &str = "user_name";
const IS_LOGGED_IN_KEY: &str = "is_logged_in";

/// Preference store backed by the shared SQLite pool
#[derive(Clone)]
pub struct PreferenceStore {
    db: SqlitePool,
}

impl PreferenceStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get the play mode preference (defaults to `All` if never set)
    pub async fn play_mode(&self) -> Result<PlayMode> {
        match get_setting::<String>(&self.db, PLAY_MODE_KEY).await? {
            Some(value) => Ok(PlayMode::from_stored(&value)),
            None => {
                set_setting(&self.db, PLAY_MODE_KEY, PlayMode::All.as_str()).await?;
                Ok(PlayMode::All)
            }
        }
    }

    /// Persist the play mode preference
    pub async fn set_play_mode(&self, mode: PlayMode) -> Result<()> {
        debug!("Persisting play mode: {}", mode);
        set_setting(&self.db, PLAY_MODE_KEY, mode.as_str()).await
    }

    /// Store the user name and mark the session logged in
    pub async fn save_user(&self, name: &str) -> Result<()> {
        set_setting(&self.db, USER_NAME_KEY, name).await?;
        set_setting(&self.db, IS_LOGGED_IN_KEY, true).await
    }

    /// Stored user name, if any
    pub async fn user_name(&self) -> Result<Option<String>> {
        get_setting::<String>(&self.db, USER_NAME_KEY).await
    }

    pub async fn is_logged_in(&self) -> Result<bool> {
        Ok(get_setting::<bool>(&self.db, IS_LOGGED_IN_KEY)
            .await?
            .unwrap_or(false))
    }

    /// Clear the login scalars (play mode is kept)
    pub async fn log_out(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key IN (?, ?)")
            .bind(USER_NAME_KEY)
            .bind(IS_LOGGED_IN_KEY)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Read a typed setting, `None` when absent
async fn get_setting<T: FromStr>(db: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(harmonia_common::Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))
            .into()),
        },
        None => Ok(None),
    }
}

/// Write a setting, replacing any previous value
async fn set_setting<T: ToString>(db: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;
    Ok(())
}
