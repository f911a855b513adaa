//! Bookmark queries. One bookmark per (album, user).

use crate::rows::{conflict_or, now};
use spindle_core::{AlbumId, Bookmark, BookmarkId, CreateBookmark, Result, SpindleError, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const COLUMNS: &str = "id, album_id, user_id, created_at, updated_at";
const DUPLICATE: &str = "This album is already bookmarked";

fn from_row(row: &SqliteRow) -> Result<Bookmark> {
    Ok(Bookmark {
        id: row.try_get("id")?,
        album: row.try_get("album_id")?,
        user: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_by_id(pool: &SqlitePool, id: &BookmarkId) -> Result<Option<Bookmark>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM bookmarks WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// The user's bookmark on an album, if any
pub async fn get_for_album(pool: &SqlitePool, user: &UserId, album: &AlbumId) -> Result<Option<Bookmark>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM bookmarks WHERE user_id = ? AND album_id = ?"
    ))
    .bind(user)
    .bind(album)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

async fn require_album(pool: &SqlitePool, album: &AlbumId) -> Result<()> {
    if crate::albums::exists(pool, album).await? {
        Ok(())
    } else {
        Err(SpindleError::not_found("Album", album.as_str()))
    }
}

pub async fn create(pool: &SqlitePool, owner: &UserId, bookmark: CreateBookmark) -> Result<Bookmark> {
    require_album(pool, &bookmark.album).await?;

    let id = BookmarkId::generate();
    let timestamp = now();

    sqlx::query(
        "INSERT INTO bookmarks (id, album_id, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&bookmark.album)
    .bind(owner)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await
    .map_err(|e| conflict_or(e, DUPLICATE))?;

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::storage("Failed to retrieve created bookmark"))
}

/// Point the bookmark at another album
pub async fn update(pool: &SqlitePool, id: &BookmarkId, changes: CreateBookmark) -> Result<Bookmark> {
    require_album(pool, &changes.album).await?;

    let result = sqlx::query(
        "UPDATE bookmarks
         SET album_id = ?, version = version + 1, updated_at = ?
         WHERE id = ?",
    )
    .bind(&changes.album)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| conflict_or(e, DUPLICATE))?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("Bookmark", id.as_str()));
    }

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Bookmark", id.as_str()))
}

pub async fn delete(pool: &SqlitePool, id: &BookmarkId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
