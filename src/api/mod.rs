//! HTTP API handlers
//!
//! Handlers are grouped by concern: public browse/search, admin mutations,
//! session handling, and the health endpoint.

pub mod admin;
pub mod auth;
pub mod health;
pub mod researchers;
