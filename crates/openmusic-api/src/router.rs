use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use serde_json::json;

use crate::auth::{self, AppState};
use crate::catalog;
use crate::collaborations;
use crate::middleware::require_auth;
use crate::playlists;

/// All routes. CORS and tracing layers are added by the binary.
pub fn build(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/users", post(auth::register))
        .route(
            "/authentications",
            post(auth::login).put(auth::refresh).delete(auth::logout),
        )
        .route("/albums", post(catalog::create_album))
        .route(
            "/albums/{id}",
            get(catalog::get_album)
                .put(catalog::update_album)
                .delete(catalog::delete_album),
        )
        .route("/songs", post(catalog::create_song).get(catalog::get_songs))
        .route(
            "/songs/{id}",
            get(catalog::get_song)
                .put(catalog::update_song)
                .delete(catalog::delete_song),
        )
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route(
            "/collaborations",
            post(collaborations::add_collaboration).delete(collaborations::delete_collaboration),
        )
        .route(
            "/playlists",
            post(playlists::create_playlist).get(playlists::get_playlists),
        )
        .route("/playlists/{id}", delete(playlists::delete_playlist))
        .route(
            "/playlists/{id}/songs",
            post(playlists::add_song)
                .get(playlists::get_songs)
                .delete(playlists::remove_song),
        )
        .route("/playlists/{id}/activities", get(playlists::get_activities))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "success" }))
}
