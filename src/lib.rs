//! Timed links: short human-typeable codes that resolve to an opaque payload
//! for a limited time, with a fixed-window rate limiter sharing the same
//! key-value store.

pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod types;
pub mod utils;
pub mod validations;
