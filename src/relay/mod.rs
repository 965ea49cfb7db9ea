use axum::Router;

use crate::state::RelayState;

pub mod dto;
pub mod handlers;
pub mod services;

pub fn router() -> Router<RelayState> {
    Router::new().merge(handlers::relay_routes())
}
