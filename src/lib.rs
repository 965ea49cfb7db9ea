pub mod app;
pub mod config;
pub mod error;
pub mod print;
pub mod relay;
pub mod state;
