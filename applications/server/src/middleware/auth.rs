/// Authentication middleware
use crate::{error::ServerError, services::auth::token_from_headers, state::AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use spindle_core::{Actor, User, UserId};

/// The authenticated account, stored in request extensions by
/// [`auth_middleware`]. Can be used as an extractor in handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn user(&self) -> &User {
        &self.0
    }

    pub fn user_id(&self) -> &UserId {
        &self.0.id
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.0.id.clone(), self.0.role)
    }
}

/// Resolve the caller from a Bearer token or the `token` cookie
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = token_from_headers(request.headers()).ok_or_else(|| {
        ServerError::Unauthenticated(
            "You are not logged in! Please log in to get access".to_string(),
        )
    })?;

    let claims = state.auth_service.verify_token(&token).map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ServerError::Unauthenticated("Invalid token. Please log in again".to_string())
    })?;

    let user = spindle_storage::users::get_by_id(&state.pool, &UserId::new(claims.sub.as_str()))
        .await?
        .filter(|user| user.active)
        .ok_or_else(|| {
            ServerError::Unauthenticated(
                "The user belonging to this token does no longer exist".to_string(),
            )
        })?;

    if let Some(changed_at) = user.password_changed_at.as_deref() {
        if claims.issued_before(changed_at) {
            return Err(ServerError::Unauthenticated(
                "User recently changed password! Please log in again".to_string(),
            ));
        }
    }

    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServerError::Unauthenticated("Not authenticated".to_string()))
    }
}
