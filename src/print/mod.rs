use axum::Router;

use crate::state::PrintState;

pub mod dedup;
pub mod dto;
pub mod handlers;
pub mod overlay;
pub mod pdf;
pub mod render;
pub mod services;
pub mod spooler;
pub mod template;

pub fn router() -> Router<PrintState> {
    Router::new().merge(handlers::print_routes())
}
