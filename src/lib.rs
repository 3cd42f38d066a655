//! researchdir library - researcher directory service
//!
//! Public JSON search/browse of researcher profiles plus an admin-gated
//! create/update/delete workflow with photo upload, backed by SQLite.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod upload;

pub use config::Config;
pub use error::{Error, Result};

use api::auth::SessionStore;

/// Request body cap for the mutation routes (photo uploads included)
const MAX_FORM_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Effective service configuration
    pub config: Arc<Config>,
    /// In-process session map
    pub sessions: SessionStore,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            sessions: SessionStore::default(),
        }
    }
}

/// Build application router
///
/// Mutation and admin-listing routes sit behind the admin gate; the public
/// listing, login/logout, and health stay open.
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require a privileged session)
    let protected = Router::new()
        .route("/admin", get(api::admin::admin_listing))
        .route(
            "/add",
            get(api::admin::new_researcher_template).post(api::admin::create_researcher),
        )
        .route(
            "/edit/:id",
            get(api::admin::edit_researcher_form).post(api::admin::update_researcher),
        )
        .route("/delete/:id", get(api::admin::delete_researcher))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_admin,
        ))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/", get(|| async { Redirect::to("/researchers") }))
        .route("/researchers", get(api::researchers::list_researchers))
        .route("/login", get(api::auth::login_form).post(api::auth::login))
        .route("/logout", get(api::auth::logout))
        .merge(api::health::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
