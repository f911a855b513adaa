/// Session API routes: register, login, logout, password change
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use spindle_core::types::validate_new_password;
use spindle_core::{CreateUser, Role, User};
use spindle_storage::users;

const BAD_CREDENTIALS: &str = "Incorrect email or password";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub location: Option<String>,
    #[serde(default)]
    pub fav_genres: Vec<String>,
    #[serde(default)]
    pub fav_artists: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub password: String,
    pub confirm_password: String,
}

/// Issue a token for `user`, set it as the session cookie and echo it in the body
pub(crate) fn send_token(app_state: &AppState, user: &User, status: StatusCode) -> Result<Response> {
    let token = app_state.auth_service.create_token(&user.id)?;
    let cookie = app_state.auth_service.session_cookie(&token);

    let body = Json(json!({
        "status": "success",
        "token": token,
        "user": user,
    }));

    Ok((status, [(header::SET_COOKIE, cookie)], body).into_response())
}

/// POST /api/v1/users/register
pub async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response> {
    validate_new_password(&req.password, &req.confirm_password)?;
    let password_hash = app_state.auth_service.hash_password(&req.password)?;

    let user = users::create(
        &app_state.pool,
        CreateUser {
            name: req.name,
            email: req.email,
            username: req.username,
            password_hash,
            role: Role::User,
            location: req.location,
            fav_genres: req.fav_genres,
            fav_artists: req.fav_artists,
        },
    )
    .await?;

    tracing::info!(user = %user.id, "account registered");
    send_token(&app_state, &user, StatusCode::CREATED)
}

/// POST /api/v1/auth/login
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ServerError::BadRequest(
            "Please provide email and password".to_string(),
        ));
    };

    let user = users::get_by_email(&app_state.pool, &email)
        .await?
        .filter(|user| user.active)
        .ok_or_else(|| ServerError::Unauthenticated(BAD_CREDENTIALS.to_string()))?;

    let password_hash = users::get_password_hash(&app_state.pool, &user.id)
        .await?
        .ok_or_else(|| ServerError::Unauthenticated(BAD_CREDENTIALS.to_string()))?;

    if !app_state.auth_service.verify_password(&password, &password_hash)? {
        tracing::info!(user = %user.id, "failed login");
        return Err(ServerError::Unauthenticated(BAD_CREDENTIALS.to_string()));
    }

    send_token(&app_state, &user, StatusCode::OK)
}

/// POST /api/v1/auth/logout
pub async fn logout(State(app_state): State<AppState>) -> Response {
    let cookie = app_state.auth_service.expired_cookie();
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "status": "success" })),
    )
        .into_response()
}

/// PATCH /api/v1/auth/update-my-password
pub async fn update_my_password(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Response> {
    let current_hash = users::get_password_hash(&app_state.pool, auth.user_id())
        .await?
        .unwrap_or_default();

    if current_hash.is_empty()
        || !app_state
            .auth_service
            .verify_password(&req.current_password, &current_hash)?
    {
        return Err(ServerError::Unauthenticated(
            "Your current password is incorrect".to_string(),
        ));
    }

    validate_new_password(&req.password, &req.confirm_password)?;
    let password_hash = app_state.auth_service.hash_password(&req.password)?;
    let user = users::set_password(&app_state.pool, auth.user_id(), &password_hash).await?;

    tracing::info!(user = %user.id, "password changed");
    send_token(&app_state, &user, StatusCode::OK)
}
