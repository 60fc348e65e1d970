use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod clock;
mod dto;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod ownership;
pub mod password;
pub mod proof;
pub mod repo;
pub mod repo_types;
pub mod roles;
pub mod services;

pub fn router(state: &AppState) -> Router<AppState> {
    handlers::auth_routes(state)
}
