//! Listening history. Repeats are allowed; the same album may appear many times.

use crate::rows::now;
use spindle_core::{CreateHistory, History, HistoryId, Result, SpindleError, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const COLUMNS: &str = "id, album_id, user_id, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<History> {
    Ok(History {
        id: row.try_get("id")?,
        album: row.try_get("album_id")?,
        user: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_by_id(pool: &SqlitePool, id: &HistoryId) -> Result<Option<History>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM history WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn create(pool: &SqlitePool, owner: &UserId, entry: CreateHistory) -> Result<History> {
    if !crate::albums::exists(pool, &entry.album).await? {
        return Err(SpindleError::not_found("Album", entry.album.as_str()));
    }

    let id = HistoryId::generate();
    let timestamp = now();

    sqlx::query(
        "INSERT INTO history (id, album_id, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&entry.album)
    .bind(owner)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await?;

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::storage("Failed to retrieve created history entry"))
}

pub async fn update(pool: &SqlitePool, id: &HistoryId, changes: CreateHistory) -> Result<History> {
    if !crate::albums::exists(pool, &changes.album).await? {
        return Err(SpindleError::not_found("Album", changes.album.as_str()));
    }

    let result = sqlx::query(
        "UPDATE history
         SET album_id = ?, version = version + 1, updated_at = ?
         WHERE id = ?",
    )
    .bind(&changes.album)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("History", id.as_str()));
    }

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SpindleError::not_found("History", id.as_str()))
}

pub async fn delete(pool: &SqlitePool, id: &HistoryId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM history WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
