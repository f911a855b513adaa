/// Bookmark API routes
use super::{one, paged, query_params, ListQuery};
use crate::{error::Result, middleware::AuthenticatedUser, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use spindle_core::access::{authorize, require_role};
use spindle_core::query::{fields, Hydration, QueryPipeline, BOOKMARK_SCHEMA};
use spindle_core::{AlbumId, Bookmark, BookmarkId, CreateBookmark, Role, SpindleError};
use spindle_storage::{bookmarks, query};
use sqlx::SqlitePool;

async fn load(pool: &SqlitePool, id: &str) -> Result<Bookmark> {
    let id = BookmarkId::new(id);
    bookmarks::get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Bookmark", id.as_str()).into())
}

/// GET /api/v1/bookmarks
pub async fn my_bookmarks(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&BOOKMARK_SCHEMA)
        .scope(fields::USER, auth.user_id().as_str())
        .build(&query_params(params));
    let page = query::find_hydrated(&app_state.pool, &descriptor, &[Hydration::Album]).await?;
    paged("bookmarks", &page)
}

/// GET /api/v1/bookmarks/admin
pub async fn all_bookmarks(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let descriptor = QueryPipeline::new(&BOOKMARK_SCHEMA).build(&query_params(params));
    let page = query::find_hydrated(
        &app_state.pool,
        &descriptor,
        &[Hydration::Album, Hydration::Owner],
    )
    .await?;
    paged("bookmarks", &page)
}

/// POST /api/v1/bookmarks
pub async fn create_bookmark(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<CreateBookmark>,
) -> Result<(StatusCode, Json<Value>)> {
    let bookmark = bookmarks::create(&app_state.pool, auth.user_id(), req).await?;
    Ok((StatusCode::CREATED, one("bookmark", &bookmark)?))
}

/// GET /api/v1/bookmarks/album/:album_id
///
/// The caller's bookmark on this album.
pub async fn bookmark_for_album(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(album): Path<String>,
) -> Result<Json<Value>> {
    let album = AlbumId::new(album);
    let bookmark = bookmarks::get_for_album(&app_state.pool, auth.user_id(), &album)
        .await?
        .ok_or_else(|| SpindleError::not_found("Bookmark", album.as_str()))?;
    one("bookmark", &bookmark)
}

/// GET /api/v1/bookmarks/:id
pub async fn get_bookmark(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let bookmark = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    one("bookmark", &bookmark)
}

/// PATCH /api/v1/bookmarks/:id
pub async fn update_bookmark(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(changes): Json<CreateBookmark>,
) -> Result<Json<Value>> {
    let bookmark = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    let updated = bookmarks::update(&app_state.pool, &bookmark.id, changes).await?;
    one("bookmark", &updated)
}

/// DELETE /api/v1/bookmarks/:id
pub async fn delete_bookmark(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let bookmark = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    bookmarks::delete(&app_state.pool, &bookmark.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
