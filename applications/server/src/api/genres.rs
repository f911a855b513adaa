/// Genre API routes
use super::{one, paged, query_params, ListQuery};
use crate::{error::Result, middleware::AuthenticatedUser, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use spindle_core::access::authorize;
use spindle_core::query::{fields, QueryPipeline, GENRE_SCHEMA};
use spindle_core::{CreateGenre, Genre, GenreId, SpindleError, UpdateGenre};
use spindle_storage::{genres, query};
use sqlx::SqlitePool;

async fn load(pool: &SqlitePool, id: &str) -> Result<Genre> {
    let id = GenreId::new(id);
    genres::get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Genre", id.as_str()).into())
}

/// GET /api/v1/genres/all
pub async fn all_genres(
    State(app_state): State<AppState>,
    params: ListQuery,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&GENRE_SCHEMA).build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("genres", &page)
}

/// GET /api/v1/genres
pub async fn my_genres(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&GENRE_SCHEMA)
        .scope(fields::USER, auth.user_id().as_str())
        .build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("genres", &page)
}

/// POST /api/v1/genres
pub async fn create_genre(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<CreateGenre>,
) -> Result<(StatusCode, Json<Value>)> {
    let genre = genres::create(&app_state.pool, auth.user_id(), req).await?;
    Ok((StatusCode::CREATED, one("genre", &genre)?))
}

/// GET /api/v1/genres/show/:slug
pub async fn genre_by_slug(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    let genre = genres::get_by_slug(&app_state.pool, &slug)
        .await?
        .ok_or_else(|| SpindleError::not_found("Genre", slug.as_str()))?;

    one("genre", &authorize(genre, &auth.actor())?)
}

/// GET /api/v1/genres/:id
pub async fn get_genre(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let genre = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    one("genre", &genre)
}

/// PATCH /api/v1/genres/:id
pub async fn update_genre(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(changes): Json<UpdateGenre>,
) -> Result<Json<Value>> {
    let genre = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    let updated = genres::update(&app_state.pool, &genre.id, changes).await?;
    one("genre", &updated)
}

/// DELETE /api/v1/genres/:id
pub async fn delete_genre(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let genre = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    genres::delete(&app_state.pool, &genre.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
