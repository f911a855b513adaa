//! Spindle Storage
//!
//! `SQLite` persistence for the Spindle catalog.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each resource owns its own queries (`albums`,
//!   `reviews`, `genres`, `bookmarks`, `history`, `users`)
//! - **Generic Listing**: [`query::find_page`] executes any
//!   `QueryDescriptor` with bound parameters only
//! - **Rating Maintenance**: [`ratings`] keeps each album's summary equal to
//!   its current review set
//!
//! # Example
//!
//! ```rust,no_run
//! use spindle_core::query::{QueryParams, QueryPipeline, ALBUM_SCHEMA};
//! use spindle_storage::{create_pool, query, run_migrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://spindle.db").await?;
//! run_migrations(&pool).await?;
//!
//! let params = QueryParams::from_pairs([("genre", "jazz"), ("sort", "-ratingsAverage")]);
//! let descriptor = QueryPipeline::new(&ALBUM_SCHEMA).build(&params);
//! let page = query::find_page(&pool, &descriptor).await?;
//! println!("{} of {} albums", page.items.len(), page.total_count);
//! # Ok(())
//! # }
//! ```

mod error;
mod rows;

// Vertical slices
pub mod albums;
pub mod bookmarks;
pub mod genres;
pub mod history;
pub mod reviews;
pub mod users;

// Shared machinery
pub mod query;
pub mod ratings;

pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://spindle.db>`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "creating pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        // Readers keep going while the single writer holds the lock
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    tracing::info!("database pool ready");

    Ok(pool)
}
