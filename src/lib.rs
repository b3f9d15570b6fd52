//! Stateless bearer-token authentication and role-based authorization for axum services.
//!
//! Login issues an HS256-signed token; every later request is authenticated from that token
//! alone and checked against the roles its endpoint declares.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
