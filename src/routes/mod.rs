use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

mod directors;
mod genres;
mod movies;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(movies::router())
        .merge(directors::router())
        .merge(genres::router())
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}
