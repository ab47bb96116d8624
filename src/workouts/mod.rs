use axum::{middleware, Router};

use crate::{auth::identity::require_user, state::AppState};

mod dto;
pub mod handlers;
pub mod ownership;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::write_routes().route_layer(middleware::from_fn(require_user)))
        .merge(handlers::read_routes())
}
