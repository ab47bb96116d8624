use axum::{middleware, Router};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod identity;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod tokens;
pub mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::me_routes().route_layer(middleware::from_fn(identity::require_user)))
        .merge(handlers::public_routes())
}
