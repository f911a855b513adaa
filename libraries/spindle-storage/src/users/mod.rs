//! User accounts and credentials
//!
//! Password hashes live in `user_credentials` and are only ever read through
//! [`get_password_hash`].

use crate::query::push_id_list;
use crate::rows::{conflict_or, decode_list, encode_list, now};
use spindle_core::types::UserSummary;
use spindle_core::{CreateUser, Result, SpindleError, UpdateUser, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const COLUMNS: &str = "id, name, email, username, role, active, location, fav_genres, \
                       fav_artists, avatar, password_changed_at, created_at, updated_at";
const DUPLICATE: &str = "This email or username is already in use";

fn from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        role: role.parse()?,
        active: row.try_get::<i64, _>("active")? != 0,
        location: row.try_get("location")?,
        fav_genres: decode_list(row.try_get("fav_genres")?)?,
        fav_artists: decode_list(row.try_get("fav_artists")?)?,
        avatar: row.try_get("avatar")?,
        password_changed_at: row.try_get("password_changed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Any account, active or not
pub async fn get_by_id(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Every account, by name
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM users ORDER BY name, id"))
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

pub async fn get_password_hash(pool: &SqlitePool, id: &UserId) -> Result<Option<String>> {
    let row = sqlx::query("SELECT password_hash FROM user_credentials WHERE user_id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| r.try_get("password_hash"))
        .transpose()
        .map_err(Into::into)
}

/// Create the account and its credentials together
pub async fn create(pool: &SqlitePool, user: CreateUser) -> Result<User> {
    let user = user.normalized()?;
    let id = UserId::generate();
    let timestamp = now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, name, email, username, role, location, fav_genres, fav_artists,
                            created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user.name.trim())
    .bind(&user.email)
    .bind(&user.username)
    .bind(user.role.as_str())
    .bind(&user.location)
    .bind(encode_list(&user.fav_genres)?)
    .bind(encode_list(&user.fav_artists)?)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await
    .map_err(|e| conflict_or(e, DUPLICATE))?;

    sqlx::query(
        "INSERT INTO user_credentials (user_id, password_hash, updated_at)
         VALUES (?, ?, ?)",
    )
    .bind(&id)
    .bind(&user.password_hash)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(user = %id, username = %user.username, role = %user.role, "user created");

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::storage("Failed to retrieve created user"))
}

/// Apply the provided fields
pub async fn update(pool: &SqlitePool, id: &UserId, changes: UpdateUser) -> Result<User> {
    let changes = changes.normalized()?;

    let mut builder =
        QueryBuilder::<Sqlite>::new("UPDATE users SET version = version + 1, updated_at = ");
    builder.push_bind(now());

    let text_fields = [
        ("name", changes.name),
        ("email", changes.email),
        ("username", changes.username),
        ("location", changes.location),
        ("avatar", changes.avatar),
        ("role", changes.role.map(|r| r.as_str().to_string())),
        ("fav_genres", changes.fav_genres.as_deref().map(encode_list).transpose()?),
        ("fav_artists", changes.fav_artists.as_deref().map(encode_list).transpose()?),
    ];
    for (column, value) in text_fields {
        if let Some(value) = value {
            builder.push(format!(", {column} = "));
            builder.push_bind(value);
        }
    }
    if let Some(active) = changes.active {
        builder.push(", active = ").push_bind(i64::from(active));
    }
    builder.push(" WHERE id = ").push_bind(id.as_str().to_string());

    let result = builder
        .build()
        .execute(pool)
        .await
        .map_err(|e| conflict_or(e, DUPLICATE))?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("User", id.as_str()));
    }

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SpindleError::not_found("User", id.as_str()))
}

/// Replace the password hash and stamp `password_changed_at`
///
/// Tokens issued before the stamp are rejected by the auth layer.
pub async fn set_password(pool: &SqlitePool, id: &UserId, password_hash: &str) -> Result<User> {
    let timestamp = now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO user_credentials (user_id, password_hash, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(user_id)
         DO UPDATE SET password_hash = excluded.password_hash, updated_at = excluded.updated_at",
    )
    .bind(id)
    .bind(password_hash)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query(
        "UPDATE users
         SET password_changed_at = ?, version = version + 1, updated_at = ?
         WHERE id = ?",
    )
    .bind(&timestamp)
    .bind(&timestamp)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("User", id.as_str()));
    }

    tx.commit().await?;

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SpindleError::not_found("User", id.as_str()))
}

/// Self-service account removal
///
/// The account is kept but deactivated; its albums, genres and bookmarks are
/// deleted. Reviews the user wrote on other albums stay.
pub async fn deactivate(pool: &SqlitePool, id: &UserId) -> Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE users SET active = 0, version = version + 1, updated_at = ? WHERE id = ?",
    )
    .bind(now())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("User", id.as_str()));
    }

    for table in ["albums", "genres", "bookmarks"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE user_id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!(user = %id, "user deactivated");
    Ok(())
}

/// Hard delete. Everything the user owns goes with the account, and every
/// album that lost one of their reviews gets its summary rebuilt.
///
/// The account row is touched first so the transaction holds the write lock
/// before the reviewed albums are read; no review by this user can commit
/// between that read and the delete.
pub async fn delete(pool: &SqlitePool, id: &UserId) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query("UPDATE users SET version = version + 1 WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if claimed.rows_affected() == 0 {
        return Ok(false);
    }

    let reviewed = crate::reviews::albums_reviewed_by(&mut *tx, id).await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    for album in &reviewed {
        crate::ratings::recompute_after_write(pool, album).await;
    }

    tracing::info!(user = %id, albums_recomputed = reviewed.len(), "user deleted");
    Ok(true)
}

/// Summaries for hydration
pub async fn summaries(pool: &SqlitePool, ids: &[String]) -> Result<Vec<UserSummary>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder =
        QueryBuilder::<Sqlite>::new("SELECT id, name, username, location, avatar FROM users");
    push_id_list(&mut builder, ids);

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter()
        .map(|row| {
            Ok(UserSummary {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                username: row.try_get("username")?,
                location: row.try_get("location")?,
                avatar: row.try_get("avatar")?,
            })
        })
        .collect()
}
