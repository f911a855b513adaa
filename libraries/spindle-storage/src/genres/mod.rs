use crate::rows::{conflict_or, now};
use spindle_core::slug::slugify;
use spindle_core::types::validate_genre_name;
use spindle_core::{CreateGenre, Genre, GenreId, Result, SpindleError, UpdateGenre, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const COLUMNS: &str = "id, name, slug, user_id, created_at, updated_at";
const DUPLICATE: &str = "A genre with this name already exists";

fn from_row(row: &SqliteRow) -> Result<Genre> {
    Ok(Genre {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        user: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_by_id(pool: &SqlitePool, id: &GenreId) -> Result<Option<Genre>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM genres WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Genre>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM genres WHERE slug = ?"))
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn create(pool: &SqlitePool, owner: &UserId, genre: CreateGenre) -> Result<Genre> {
    let name = validate_genre_name(&genre.name)?;
    let id = GenreId::generate();
    let timestamp = now();

    sqlx::query(
        "INSERT INTO genres (id, name, slug, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&name)
    .bind(slugify(&name))
    .bind(owner)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await
    .map_err(|e| conflict_or(e, DUPLICATE))?;

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::storage("Failed to retrieve created genre"))
}

/// Rename; the slug follows the name
pub async fn update(pool: &SqlitePool, id: &GenreId, changes: UpdateGenre) -> Result<Genre> {
    if let Some(name) = changes.name {
        let name = validate_genre_name(&name)?;
        let result = sqlx::query(
            "UPDATE genres
             SET name = ?, slug = ?, version = version + 1, updated_at = ?
             WHERE id = ?",
        )
        .bind(&name)
        .bind(slugify(&name))
        .bind(now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| conflict_or(e, DUPLICATE))?;

        if result.rows_affected() == 0 {
            return Err(SpindleError::not_found("Genre", id.as_str()));
        }
    }

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Genre", id.as_str()))
}

pub async fn delete(pool: &SqlitePool, id: &GenreId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM genres WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
