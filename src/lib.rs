pub mod config;
pub mod handlers;
pub mod media;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
