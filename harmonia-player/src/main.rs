//! Harmonia - headless entry point
//!
//! Wires the session core together without a UI: scans the music
//! directory, loads the favorite and preference stores, starts a
//! session against the no-output engine and logs the resulting playable
//! list. Useful for smoke runs and for inspecting a library from the
//! command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harmonia_player::catalog::{CatalogScanner, FsContentIndex};
use harmonia_player::config::Config;
use harmonia_player::db::favorites::FavoriteStore;
use harmonia_player::db::settings::PreferenceStore;
use harmonia_player::db::init_database;
use harmonia_player::engine::NullEngine;
use harmonia_player::session::SessionManager;

/// Command-line arguments for harmonia
#[derive(Parser, Debug)]
#[command(name = "harmonia")]
#[command(about = "Local music player session core")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "HARMONIA_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder containing music files (overrides the config file)
    #[arg(short, long, env = "HARMONIA_MUSIC_DIR")]
    music_dir: Option<PathBuf>,

    /// Database path (overrides the config file)
    #[arg(short, long, env = "HARMONIA_DB_PATH")]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harmonia_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).context("Failed to load configuration")?,
        None => Config::default(),
    };
    if let Some(music_dir) = args.music_dir {
        config.music_dir = music_dir;
    }
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }

    info!("Music directory: {}", config.music_dir.display());
    info!("Database: {}", config.db_path.display());

    let pool = init_database(&config.db_path)
        .await
        .context("Failed to initialize database")?;

    let favorites = FavoriteStore::new(pool.clone())
        .await
        .context("Failed to load favorite store")?;
    let prefs = PreferenceStore::new(pool.clone());

    let index = Arc::new(FsContentIndex::new(&config.music_dir));
    let scanner = CatalogScanner::new(index);
    let engine = Arc::new(NullEngine::new());

    let manager = SessionManager::new(scanner, favorites.clone(), prefs, engine)
        .await
        .context("Failed to construct session manager")?;

    let mut errors = manager.state().subscribe_errors();
    manager
        .load_session()
        .await
        .context("Failed to load session")?;

    if let Ok(kind) = errors.try_recv() {
        info!("Session reported: {:?}", kind);
    }

    let songs = manager.state().songs();
    info!(
        "Playable list ({} mode): {} songs",
        manager.state().play_mode(),
        songs.len()
    );
    for (i, song) in songs.iter().enumerate() {
        let marker = if song.is_favorite { "*" } else { " " };
        info!(
            "{marker} {i:3} {} - {} [{}]",
            song.track.artist,
            song.track.title,
            song.track.duration_display()
        );
    }

    let favorite_count = favorites.entries().await?.len();
    info!("{favorite_count} favorites stored");

    manager.shutdown().await;
    Ok(())
}
