/// Listening history API routes
use super::{many, one, paged, query_params, ListQuery};
use crate::{error::Result, middleware::AuthenticatedUser, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use spindle_core::access::require_role;
use spindle_core::query::{fields, Hydration, QueryPipeline, HISTORY_SCHEMA};
use spindle_core::{CreateHistory, History, HistoryId, Role, SpindleError};
use spindle_storage::query::{self, Record};
use spindle_storage::history;
use sqlx::SqlitePool;
use std::collections::HashSet;

async fn load(pool: &SqlitePool, id: &str) -> Result<History> {
    let id = HistoryId::new(id);
    history::get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::not_found("History", id.as_str()).into())
}

/// Hydrated albums of a history page, first occurrence wins
fn distinct_albums(items: Vec<Record>) -> Vec<Value> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|mut item| item.remove("album"))
        .filter(|album| {
            let key = album.get("id").unwrap_or(album).to_string();
            seen.insert(key)
        })
        .collect()
}

/// GET /api/v1/history
///
/// The caller's recently viewed albums, one entry per album.
pub async fn my_history(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&HISTORY_SCHEMA)
        .scope(fields::USER, auth.user_id().as_str())
        .build(&query_params(params));
    let page = query::find_hydrated(&app_state.pool, &descriptor, &[Hydration::Album]).await?;

    many("histories", &distinct_albums(page.items))
}

/// GET /api/v1/history/admin
pub async fn all_history(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let descriptor = QueryPipeline::new(&HISTORY_SCHEMA).build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("histories", &page)
}

/// GET /api/v1/history/album/:id
pub async fn album_history(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(album): Path<String>,
    params: ListQuery,
) -> Result<Json<Value>> {
    let descriptor = QueryPipeline::new(&HISTORY_SCHEMA)
        .scope(fields::ALBUM, album)
        .build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("histories", &page)
}

/// POST /api/v1/history
pub async fn create_history(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<CreateHistory>,
) -> Result<(StatusCode, Json<Value>)> {
    let entry = history::create(&app_state.pool, auth.user_id(), req).await?;
    Ok((StatusCode::CREATED, one("history", &entry)?))
}

/// GET /api/v1/history/:id (admin)
pub async fn get_history(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    require_role(&auth.actor(), &[Role::Admin])?;
    one("history", &load(&app_state.pool, &id).await?)
}

/// PATCH /api/v1/history/:id (admin)
pub async fn update_history(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(changes): Json<CreateHistory>,
) -> Result<Json<Value>> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let entry = load(&app_state.pool, &id).await?;
    let updated = history::update(&app_state.pool, &entry.id, changes).await?;
    one("history", &updated)
}

/// DELETE /api/v1/history/:id (admin)
pub async fn delete_history(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let entry = load(&app_state.pool, &id).await?;
    history::delete(&app_state.pool, &entry.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
