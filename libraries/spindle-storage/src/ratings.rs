//! Album rating maintenance
//!
//! An album's `ratings_quantity` / `ratings_average` pair is rebuilt from its
//! full current review set after every committed review mutation. The rebuild
//! is a single `UPDATE ... RETURNING` statement: it takes the write lock before
//! its subqueries read, so it observes every review write committed before it
//! and both columns change together.

use serde::Serialize;
use spindle_core::ratings::{RatingStats, RatingSummary, DEFAULT_RATINGS_AVERAGE};
use spindle_core::{AlbumId, Result, SpindleError};
use sqlx::{Row, SqlitePool};

/// Count and unrounded mean of an album's reviews
pub async fn stats(pool: &SqlitePool, album_id: &AlbumId) -> Result<RatingStats> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count, AVG(rating) AS mean
         FROM reviews
         WHERE album_id = ?",
    )
    .bind(album_id)
    .fetch_one(pool)
    .await?;

    Ok(RatingStats {
        count: row.try_get("count")?,
        mean: row.try_get("mean")?,
    })
}

/// Summary currently stored on the album
pub async fn stored(pool: &SqlitePool, album_id: &AlbumId) -> Result<RatingSummary> {
    let row = sqlx::query("SELECT ratings_quantity, ratings_average FROM albums WHERE id = ?")
        .bind(album_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| SpindleError::not_found("Album", album_id.as_str()))?;

    Ok(RatingSummary {
        ratings_quantity: row.try_get("ratings_quantity")?,
        ratings_average: row.try_get("ratings_average")?,
    })
}

/// Rebuild the album's summary from its reviews. Idempotent.
pub async fn recompute(pool: &SqlitePool, album_id: &AlbumId) -> Result<RatingSummary> {
    let row = sqlx::query(
        "UPDATE albums
         SET ratings_quantity = (SELECT COUNT(*) FROM reviews WHERE album_id = ?1),
             ratings_average = COALESCE(
                 (SELECT ROUND(AVG(rating), 1) FROM reviews WHERE album_id = ?1),
                 ?2
             )
         WHERE id = ?1
         RETURNING ratings_quantity, ratings_average",
    )
    .bind(album_id)
    .bind(DEFAULT_RATINGS_AVERAGE)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| SpindleError::not_found("Album", album_id.as_str()))?;

    let summary = RatingSummary {
        ratings_quantity: row.try_get("ratings_quantity")?,
        ratings_average: row.try_get("ratings_average")?,
    };

    tracing::debug!(
        album = %album_id,
        quantity = summary.ratings_quantity,
        average = summary.ratings_average,
        "rating summary recomputed"
    );

    Ok(summary)
}

/// Follow-up to a review write that already committed
///
/// The write itself stands either way. A failure here leaves the album's
/// summary stale until the next recompute, so it is reported at error level
/// with the album id.
pub async fn recompute_after_write(pool: &SqlitePool, album_id: &AlbumId) -> Option<RatingSummary> {
    match recompute(pool, album_id).await {
        Ok(summary) => Some(summary),
        // Album deleted between the review write and now; nothing to keep in sync
        Err(SpindleError::NotFound { .. }) => None,
        Err(e) => {
            tracing::error!(
                album = %album_id,
                error = %e,
                "rating summary recompute failed; stored summary is stale until repaired"
            );
            None
        }
    }
}

/// A stored summary that disagrees with the review set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drift {
    pub album: AlbumId,
    pub stored: RatingSummary,
    pub expected: RatingSummary,
}

/// Compare stored and expected summaries without writing
pub async fn audit(pool: &SqlitePool, album_id: &AlbumId) -> Result<Option<Drift>> {
    let stored = stored(pool, album_id).await?;
    let expected = RatingSummary::from_stats(stats(pool, album_id).await?);

    Ok((!stored.matches(&expected)).then(|| Drift {
        album: album_id.clone(),
        stored,
        expected,
    }))
}

/// Outcome of [`repair_all`]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub albums_checked: usize,
    pub repaired: Vec<Drift>,
}

/// Recompute every album, reporting the ones whose stored summary changed
pub async fn repair_all(pool: &SqlitePool) -> Result<RepairReport> {
    let rows = sqlx::query("SELECT id, ratings_quantity, ratings_average FROM albums ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut report = RepairReport::default();
    for row in rows {
        let album: AlbumId = row.try_get("id")?;
        let before = RatingSummary {
            ratings_quantity: row.try_get("ratings_quantity")?,
            ratings_average: row.try_get("ratings_average")?,
        };

        let after = match recompute(pool, &album).await {
            Ok(summary) => summary,
            // Deleted while we were iterating
            Err(SpindleError::NotFound { .. }) => continue,
            Err(e) => return Err(e),
        };
        report.albums_checked += 1;

        if !before.matches(&after) {
            tracing::warn!(
                album = %album,
                stored_quantity = before.ratings_quantity,
                stored_average = before.ratings_average,
                quantity = after.ratings_quantity,
                average = after.ratings_average,
                "repaired rating summary drift"
            );
            report.repaired.push(Drift {
                album,
                stored: before,
                expected: after,
            });
        }
    }

    tracing::info!(
        checked = report.albums_checked,
        repaired = report.repaired.len(),
        "rating summary repair finished"
    );
    Ok(report)
}
