//! Favorite store
//!
//! Persists the user's favorited tracks and exposes a live view of the
//! favorite id set. Mutations are transactional; the id-set snapshot is
//! published only after the transaction commits, so a reader never
//! observes a half-applied toggle.

use crate::error::Result;
use harmonia_common::{FavoriteEntry, Track};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Favorite store backed by the shared SQLite pool
#[derive(Clone)]
pub struct FavoriteStore {
    db: SqlitePool,
    ids_tx: Arc<watch::Sender<HashSet<i64>>>,
}

impl FavoriteStore {
    /// Create the store and load the initial id-set snapshot
    pub async fn new(db: SqlitePool) -> Result<Self> {
        let ids = Self::load_ids(&db).await?;
        debug!("Loaded {} favorite ids", ids.len());
        let (ids_tx, _) = watch::channel(ids);
        Ok(Self {
            db,
            ids_tx: Arc::new(ids_tx),
        })
    }

    /// Add a track to favorites.
    ///
    /// Upsert: an existing entry has its denormalized snapshot replaced.
    /// Idempotent.
    pub async fn add(&self, track: &Track) -> Result<()> {
        let entry = FavoriteEntry::from_track(track);

        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO favorites (id, title, artist, uri, artwork_uri, duration_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist = excluded.artist,
                uri = excluded.uri,
                artwork_uri = excluded.artwork_uri,
                duration_ms = excluded.duration_ms
            "#,
        )
        .bind(entry.id)
        .bind(&entry.title)
        .bind(&entry.artist)
        .bind(&entry.uri)
        .bind(&entry.artwork_uri)
        .bind(entry.duration_ms as i64)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!("Favorited track {}", entry.id);
        self.publish_ids().await
    }

    /// Remove a track from favorites. Removing an absent id is a no-op.
    pub async fn remove(&self, id: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;
        let result = sqlx::query("DELETE FROM favorites WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() > 0 {
            debug!("Unfavorited track {}", id);
        }
        self.publish_ids().await
    }

    /// Live view of the favorite id set.
    ///
    /// A new snapshot is emitted after every committed mutation.
    pub fn ids(&self) -> watch::Receiver<HashSet<i64>> {
        self.ids_tx.subscribe()
    }

    /// Current favorite id set
    pub fn ids_snapshot(&self) -> HashSet<i64> {
        self.ids_tx.borrow().clone()
    }

    /// All favorite entries in the order they were favorited
    pub async fn entries(&self) -> Result<Vec<FavoriteEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, artist, uri, artwork_uri, duration_ms
            FROM favorites
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FavoriteEntry {
                id: row.get::<i64, _>(0),
                title: row.get::<String, _>(1),
                artist: row.get::<String, _>(2),
                uri: row.get::<String, _>(3),
                artwork_uri: row.get::<String, _>(4),
                duration_ms: row.get::<i64, _>(5) as u64,
            })
            .collect())
    }

    /// Drop every favorite (logout flow)
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM favorites")
            .execute(&self.db)
            .await?;
        self.publish_ids().await
    }

    async fn load_ids(db: &SqlitePool) -> Result<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM favorites")
            .fetch_all(db)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Re-read the committed id set and publish it to subscribers
    async fn publish_ids(&self) -> Result<()> {
        let ids = Self::load_ids(&self.db).await?;
        self.ids_tx.send_replace(ids);
        Ok(())
    }
}
