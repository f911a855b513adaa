/// Album API routes
use super::{many, one, paged, query_params, ListQuery};
use crate::{error::Result, middleware::AuthenticatedUser, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use spindle_core::access::{authorize, require_role};
use spindle_core::query::{fields, QueryPipeline, ALBUM_SCHEMA};
use spindle_core::{Album, AlbumId, CreateAlbum, Role, SpindleError, UpdateAlbum};
use spindle_storage::{albums, query};
use sqlx::SqlitePool;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

async fn load(pool: &SqlitePool, id: &str) -> Result<Album> {
    let id = AlbumId::new(id);
    albums::get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Album", id.as_str()).into())
}

/// GET /api/v1/albums
pub async fn list_albums(
    State(app_state): State<AppState>,
    params: ListQuery,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA).build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("albums", &page)
}

/// POST /api/v1/albums
pub async fn create_album(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<CreateAlbum>,
) -> Result<(StatusCode, Json<Value>)> {
    let album = albums::create(&app_state.pool, auth.user_id(), req).await?;
    Ok((StatusCode::CREATED, one("album", &album)?))
}

/// GET /api/v1/albums/user-albums
pub async fn user_albums(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA)
        .scope(fields::USER, auth.user_id().as_str())
        .build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("albums", &page)
}

/// GET /api/v1/albums/top
pub async fn top_albums(State(app_state): State<AppState>) -> Result<Json<Value>> {
    let top = albums::top(&app_state.pool).await?;
    many("albums", &top)
}

/// GET /api/v1/albums/stats (admin)
pub async fn album_stats(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Value>> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let stats = albums::genre_stats(&app_state.pool).await?;
    many("stats", &stats)
}

/// GET /api/v1/albums/tags
pub async fn all_tags(
    State(app_state): State<AppState>,
    params: ListQuery,
) -> Result<Json<Value>> {
    tagged(&app_state.pool, None, params).await
}

/// GET /api/v1/albums/tags/:tag
pub async fn albums_by_tag(
    State(app_state): State<AppState>,
    Path(tag): Path<String>,
    params: ListQuery,
) -> Result<Json<Value>> {
    tagged(&app_state.pool, Some(tag), params).await
}

/// Tag counts plus a page of albums, optionally restricted to one tag
async fn tagged(pool: &SqlitePool, tag: Option<String>, params: ListQuery) -> Result<Json<Value>> {
    let mut pipeline = QueryPipeline::new(&ALBUM_SCHEMA);
    if let Some(tag) = tag {
        pipeline = pipeline.scope(fields::TAGS, tag);
    }
    let descriptor = pipeline.build(&query_params(params));

    let tags = albums::tag_counts(pool).await?;
    let page = query::find_page(pool, &descriptor).await?;

    let Json(mut body) = paged("albums", &page)?;
    if let Value::Object(map) = &mut body {
        map.insert("tags".to_string(), serde_json::to_value(&tags)?);
    }
    Ok(Json(body))
}

/// POST /api/v1/albums/related-albums
///
/// Body is a JSON array of tags; albums carrying any of them are returned.
pub async fn related_albums(
    State(app_state): State<AppState>,
    params: ListQuery,
    Json(tags): Json<Vec<String>>,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA)
        .scope_any(fields::TAGS, tags)
        .build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("albums", &page)
}

/// GET /api/v1/albums/search?q=
pub async fn search_albums(
    State(app_state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let hits = albums::search(&app_state.pool, search.q.as_deref().unwrap_or("")).await?;
    many("albums", &hits)
}

/// GET /api/v1/albums/details/:slug
pub async fn album_by_slug(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    let album = albums::get_by_slug(&app_state.pool, &slug)
        .await?
        .ok_or_else(|| SpindleError::not_found("Album", slug.as_str()))?;

    let detail = albums::with_reviews(&app_state.pool, album).await?;
    one("album", &detail)
}

/// PATCH /api/v1/albums/like-album/:id
pub async fn like_album(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let album = albums::toggle_like(&app_state.pool, &AlbumId::new(id), auth.user_id()).await?;
    one("album", &album)
}

/// GET /api/v1/albums/:id
pub async fn get_album(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let album = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    let detail = albums::with_reviews(&app_state.pool, album).await?;
    one("album", &detail)
}

/// PATCH /api/v1/albums/:id
pub async fn update_album(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(changes): Json<UpdateAlbum>,
) -> Result<Json<Value>> {
    let album = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    let updated = albums::update(&app_state.pool, &album.id, changes).await?;
    one("album", &updated)
}

/// DELETE /api/v1/albums/:id
pub async fn delete_album(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let album = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    albums::delete(&app_state.pool, &album.id).await?;
    tracing::info!(album = %album.id, by = %auth.user_id(), "album deleted");
    Ok(StatusCode::NO_CONTENT)
}
