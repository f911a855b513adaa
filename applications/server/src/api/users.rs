/// Account API routes
use super::{one, paged, query_params, ListQuery};
use crate::{
    api::auth::send_token,
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use spindle_core::access::{authorize, require_role};
use spindle_core::query::{QueryPipeline, USER_SCHEMA};
use spindle_core::{Role, SpindleError, UpdateUser, UserId};
use spindle_storage::{query, users};

/// Self-service profile edit. Password fields are accepted only to be refused.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub fav_genres: Option<Vec<String>>,
    pub fav_artists: Option<Vec<String>>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// GET /api/v1/users/me
pub async fn me(auth: AuthenticatedUser) -> Result<Json<Value>> {
    one("user", auth.user())
}

/// PATCH /api/v1/users/update-me
pub async fn update_me(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<UpdateMeRequest>,
) -> Result<Response> {
    if req.password.is_some() || req.confirm_password.is_some() {
        return Err(ServerError::BadRequest(
            "This route is not for password updates. Please use /api/v1/auth/update-my-password"
                .to_string(),
        ));
    }

    let user = users::update(
        &app_state.pool,
        auth.user_id(),
        UpdateUser {
            name: req.name,
            email: req.email,
            username: req.username,
            location: req.location,
            fav_genres: req.fav_genres,
            fav_artists: req.fav_artists,
            avatar: req.avatar,
            role: None,
            active: None,
        },
    )
    .await?;

    send_token(&app_state, &user, StatusCode::OK)
}

/// DELETE /api/v1/users/delete-me
pub async fn delete_me(State(app_state): State<AppState>, auth: AuthenticatedUser) -> Result<Response> {
    users::deactivate(&app_state.pool, auth.user_id()).await?;

    let cookie = app_state.auth_service.expired_cookie();
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}

/// GET /api/v1/users (admin)
pub async fn list_users(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    params: ListQuery,
) -> Result<Json<Value>> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let descriptor = QueryPipeline::new(&USER_SCHEMA).build(&query_params(params));
    let page = query::find_page(&app_state.pool, &descriptor).await?;
    paged("users", &page)
}

/// GET /api/v1/users/:id (self or admin)
pub async fn get_user(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = UserId::new(id);
    let user = users::get_by_id(&app_state.pool, &id)
        .await?
        .ok_or_else(|| SpindleError::not_found("User", id.as_str()))?;

    let user = authorize(user, &auth.actor())?;
    one("user", &user)
}

/// PATCH /api/v1/users/:id (admin)
pub async fn update_user(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(changes): Json<UpdateUser>,
) -> Result<Json<Value>> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let user = users::update(&app_state.pool, &UserId::new(id), changes).await?;
    one("user", &user)
}

/// DELETE /api/v1/users/:id (admin)
pub async fn delete_user(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    require_role(&auth.actor(), &[Role::Admin])?;

    let id = UserId::new(id);
    if !users::delete(&app_state.pool, &id).await? {
        return Err(SpindleError::not_found("User", id.as_str()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
