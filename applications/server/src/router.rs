/// HTTP routing
use crate::{api, middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the full application router
///
/// Everything lives under `/api/v1` except the liveness probe at
/// `/api/health`.
pub fn create_router(app_state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/users/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/albums", get(api::albums::list_albums))
        .route("/albums/search", get(api::albums::search_albums))
        .route("/albums/tags", get(api::albums::all_tags))
        .route("/albums/tags/:tag", get(api::albums::albums_by_tag))
        .route("/albums/related-albums", post(api::albums::related_albums))
        .route("/genres/all", get(api::genres::all_genres));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Account
        .route("/auth/update-my-password", patch(api::auth::update_my_password))
        .route("/users/me", get(api::users::me))
        .route("/users/update-me", patch(api::users::update_me))
        .route("/users/delete-me", axum::routing::delete(api::users::delete_me))
        .route("/users", get(api::users::list_users))
        .route(
            "/users/:id",
            get(api::users::get_user)
                .patch(api::users::update_user)
                .delete(api::users::delete_user),
        )
        // Albums
        .route("/albums", post(api::albums::create_album))
        .route("/albums/user-albums", get(api::albums::user_albums))
        .route("/albums/top", get(api::albums::top_albums))
        .route("/albums/stats", get(api::albums::album_stats))
        .route("/albums/details/:slug", get(api::albums::album_by_slug))
        .route("/albums/like-album/:id", patch(api::albums::like_album))
        .route(
            "/albums/:id",
            get(api::albums::get_album)
                .patch(api::albums::update_album)
                .delete(api::albums::delete_album),
        )
        // Reviews
        .route(
            "/albums/:id/reviews",
            get(api::reviews::list_album_reviews).post(api::reviews::create_album_review),
        )
        .route(
            "/reviews",
            get(api::reviews::list_reviews).post(api::reviews::create_review),
        )
        .route(
            "/reviews/:id",
            get(api::reviews::get_review)
                .patch(api::reviews::update_review)
                .delete(api::reviews::delete_review),
        )
        // Genres
        .route(
            "/genres",
            get(api::genres::my_genres).post(api::genres::create_genre),
        )
        .route("/genres/show/:slug", get(api::genres::genre_by_slug))
        .route(
            "/genres/:id",
            get(api::genres::get_genre)
                .patch(api::genres::update_genre)
                .delete(api::genres::delete_genre),
        )
        // Bookmarks
        .route(
            "/bookmarks",
            get(api::bookmarks::my_bookmarks).post(api::bookmarks::create_bookmark),
        )
        .route("/bookmarks/admin", get(api::bookmarks::all_bookmarks))
        .route(
            "/bookmarks/album/:album_id",
            get(api::bookmarks::bookmark_for_album),
        )
        .route(
            "/bookmarks/:id",
            get(api::bookmarks::get_bookmark)
                .patch(api::bookmarks::update_bookmark)
                .delete(api::bookmarks::delete_bookmark),
        )
        // History
        .route(
            "/history",
            get(api::history::my_history).post(api::history::create_history),
        )
        .route("/history/admin", get(api::history::all_history))
        .route("/history/album/:id", get(api::history::album_history))
        .route(
            "/history/:id",
            get(api::history::get_history)
                .patch(api::history::update_history)
                .delete(api::history::delete_history),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(api::health::health))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
