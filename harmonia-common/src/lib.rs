//! # Harmonia Common Library
//!
//! Shared code for the Harmonia player crates including:
//! - Domain types (Track, Song, PlayMode, FavoriteEntry)
//! - Session event types (SessionEvent enum)
//! - Common error type
//! - Time formatting utilities

pub mod error;
pub mod events;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use types::{ErrorKind, FavoriteEntry, PlayMode, Song, Track};
