/// Review API routes, top level and nested under an album
use super::{one, paged, query_params, ListQuery};
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use spindle_core::access::{authorize, require_role};
use spindle_core::query::{fields, Hydration, QueryPipeline, REVIEW_SCHEMA};
use spindle_core::{AlbumId, CreateReview, Review, ReviewId, Role, SpindleError, UpdateReview};
use spindle_storage::{query, reviews};
use sqlx::SqlitePool;

/// Review payload; the author is always the caller
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub album: Option<AlbumId>,
    pub review: String,
    pub rating: u8,
}

async fn load(pool: &SqlitePool, id: &str) -> Result<Review> {
    let id = ReviewId::new(id);
    reviews::get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Review", id.as_str()).into())
}

async fn list(pool: &SqlitePool, album: Option<AlbumId>, params: ListQuery) -> Result<Json<Value>> {
    let mut pipeline = QueryPipeline::new(&REVIEW_SCHEMA);
    if let Some(album) = album {
        pipeline = pipeline.scope(fields::ALBUM, album.as_str());
    }
    let descriptor = pipeline.build(&query_params(params));
    let page = query::find_hydrated(pool, &descriptor, &[Hydration::Owner]).await?;
    paged("reviews", &page)
}

/// GET /api/v1/reviews
pub async fn list_reviews(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    list(&app_state.pool, None, params).await
}

/// GET /api/v1/albums/:id/reviews
pub async fn list_album_reviews(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(album): Path<String>,
    params: ListQuery,
) -> Result<Json<Value>> {
    list(&app_state.pool, Some(AlbumId::new(album)), params).await
}

async fn create(
    pool: &SqlitePool,
    auth: &AuthenticatedUser,
    album: Option<AlbumId>,
    req: CreateReviewRequest,
) -> Result<(StatusCode, Json<Value>)> {
    require_role(&auth.actor(), &[Role::User])?;

    let album = album
        .or(req.album)
        .ok_or_else(|| ServerError::BadRequest("Review must belong to an album".to_string()))?;

    let review = reviews::create(
        pool,
        CreateReview {
            album,
            user: auth.user_id().clone(),
            review: req.review,
            rating: req.rating,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, one("review", &review)?))
}

/// POST /api/v1/reviews
pub async fn create_review(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    create(&app_state.pool, &auth, None, req).await
}

/// POST /api/v1/albums/:id/reviews
pub async fn create_album_review(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(album): Path<String>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    create(&app_state.pool, &auth, Some(AlbumId::new(album)), req).await
}

/// GET /api/v1/reviews/:id
pub async fn get_review(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let review = load(&app_state.pool, &id).await?;
    one("review", &review)
}

/// PATCH /api/v1/reviews/:id
///
/// Only the text and the rating are editable.
pub async fn update_review(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(changes): Json<UpdateReview>,
) -> Result<Json<Value>> {
    let review = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    let updated = reviews::update(&app_state.pool, &review, changes).await?;
    one("review", &updated)
}

/// DELETE /api/v1/reviews/:id
pub async fn delete_review(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let review = authorize(load(&app_state.pool, &id).await?, &auth.actor())?;
    reviews::delete(&app_state.pool, &review).await?;
    Ok(StatusCode::NO_CONTENT)
}
