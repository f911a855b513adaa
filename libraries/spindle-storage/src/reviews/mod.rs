//! Review queries
//!
//! Every successful create, update or delete is followed by a recompute of
//! the parent album's rating summary. The album id is taken from the review
//! as it was loaded before the mutation.

use crate::ratings;
use crate::rows::{conflict_or, now};
use spindle_core::{
    AlbumId, CreateReview, Result, Review, ReviewId, SpindleError, UpdateReview, UserId,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

const COLUMNS: &str = "id, body, rating, album_id, user_id, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<Review> {
    let rating: i64 = row.try_get("rating")?;
    Ok(Review {
        id: row.try_get("id")?,
        review: row.try_get("body")?,
        rating: u8::try_from(rating)
            .map_err(|_| SpindleError::Database(format!("rating out of range: {rating}")))?,
        album: row.try_get("album_id")?,
        user: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_by_id(pool: &SqlitePool, id: &ReviewId) -> Result<Option<Review>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM reviews WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// An album's reviews, newest first
pub async fn get_by_album(pool: &SqlitePool, album: &AlbumId) -> Result<Vec<Review>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM reviews WHERE album_id = ? ORDER BY created_at DESC, id"
    ))
    .bind(album)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Albums the user has reviewed
pub async fn albums_reviewed_by(conn: &mut SqliteConnection, user: &UserId) -> Result<Vec<AlbumId>> {
    let rows = sqlx::query("SELECT DISTINCT album_id FROM reviews WHERE user_id = ?")
        .bind(user)
        .fetch_all(conn)
        .await?;

    rows.iter()
        .map(|row| row.try_get("album_id").map_err(Into::into))
        .collect()
}

/// Insert a review, then refresh the album's summary
///
/// A second review of the same album by the same user is a `Conflict` and
/// leaves the first one untouched.
pub async fn create(pool: &SqlitePool, review: CreateReview) -> Result<Review> {
    let review = review.normalized()?;

    if !crate::albums::exists(pool, &review.album).await? {
        return Err(SpindleError::not_found("Album", review.album.as_str()));
    }

    let id = ReviewId::generate();
    let timestamp = now();

    sqlx::query(
        "INSERT INTO reviews (id, body, rating, album_id, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&review.review)
    .bind(i64::from(review.rating))
    .bind(&review.album)
    .bind(&review.user)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await
    .map_err(|e| conflict_or(e, "You have already reviewed this album"))?;

    tracing::info!(review = %id, album = %review.album, rating = review.rating, "review created");

    ratings::recompute_after_write(pool, &review.album).await;

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::storage("Failed to retrieve created review"))
}

/// Edit body and/or rating of a loaded review
pub async fn update(pool: &SqlitePool, existing: &Review, changes: UpdateReview) -> Result<Review> {
    let changes = changes.normalized()?;
    let album = existing.album.clone();

    if !changes.is_empty() {
        let result = sqlx::query(
            "UPDATE reviews
             SET body = COALESCE(?, body),
                 rating = COALESCE(?, rating),
                 version = version + 1,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(changes.review.as_deref())
        .bind(changes.rating.map(i64::from))
        .bind(now())
        .bind(&existing.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SpindleError::not_found("Review", existing.id.as_str()));
        }

        ratings::recompute_after_write(pool, &album).await;
    }

    get_by_id(pool, &existing.id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Review", existing.id.as_str()))
}

/// Delete a loaded review, then refresh its album's summary
pub async fn delete(pool: &SqlitePool, existing: &Review) -> Result<()> {
    let album = existing.album.clone();

    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(&existing.id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("Review", existing.id.as_str()));
    }

    tracing::info!(review = %existing.id, album = %album, "review deleted");

    ratings::recompute_after_write(pool, &album).await;
    Ok(())
}
