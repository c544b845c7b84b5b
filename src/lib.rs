pub mod api;
pub mod cache;
pub mod config;
pub mod loader;
pub mod models;
pub mod pagination;
pub mod search;
pub mod services;
