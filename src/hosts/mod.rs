mod dto;
pub mod handlers;
mod images;
pub mod repo;
pub mod repo_types;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new().merge(handlers::host_routes(state))
}
