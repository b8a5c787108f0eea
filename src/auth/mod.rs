use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
#[cfg(test)]
pub mod repo_memory;
pub mod repo_types;
pub mod services;
pub mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::profile_routes())
}
