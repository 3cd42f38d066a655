//! Session handling and the admin gate
//!
//! A single privilege tier: a session either holds the admin marker or it
//! does not. Sessions live in an in-process map keyed by a UUID token
//! carried in an HttpOnly cookie, each with its own expiry, so concurrent
//! clients are independent. Login compares the submitted username and the
//! SHA-256 digest of the submitted password against the configured
//! credential pair.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sid";

/// Per-client session state
#[derive(Debug, Clone)]
pub struct Session {
    pub privileged: bool,
    pub created_at: DateTime<Utc>,
}

/// In-process session map shared across handlers
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    /// Create a privileged session and return its token
    pub async fn create_privileged(&self) -> Uuid {
        let token = Uuid::new_v4();
        self.inner.write().await.insert(
            token,
            Session {
                privileged: true,
                created_at: Utc::now(),
            },
        );
        token
    }

    /// Check the privileged marker, lazily dropping expired sessions
    pub async fn is_privileged(&self, token: &Uuid, ttl: Duration) -> bool {
        let mut sessions = self.inner.write().await;
        match sessions.get(token) {
            Some(session) if Utc::now() - session.created_at >= ttl => {
                sessions.remove(token);
                false
            }
            Some(session) => session.privileged,
            None => false,
        }
    }

    /// Drop a session unconditionally
    pub async fn remove(&self, token: &Uuid) {
        self.inner.write().await.remove(token);
    }
}

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Compare submitted credentials against the configured pair.
///
/// The stored password is a hex SHA-256 digest; the submitted one is hashed
/// before comparison, never compared as a literal string. Returns false
/// while no credential pair is configured.
fn credentials_match(config: &Config, username: &str, password: &str) -> bool {
    let (Some(expected_user), Some(expected_digest)) =
        (&config.admin_username, &config.admin_password_sha256)
    else {
        return false;
    };
    if username != expected_user {
        return false;
    }
    let digest = hex::encode(Sha256::digest(password.as_bytes()));
    digest.eq_ignore_ascii_case(expected_digest)
}

/// GET /login
///
/// The form contract for the external renderer; POST does the work.
pub async fn login_form() -> Json<Value> {
    Json(json!({
        "username": "",
        "password": "",
    }))
}

/// POST /login
///
/// On success, marks a fresh session as privileged and redirects to the
/// admin listing. Failures get a 401 with no session side effects.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !credentials_match(&state.config, &form.username, &form.password) {
        warn!("Failed login attempt for username '{}'", form.username);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid credentials" })),
        )
            .into_response();
    }

    let token = state.sessions.create_privileged().await;
    info!("Admin session opened");

    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .build();
    (jar.add(cookie), Redirect::to("/admin")).into_response()
}

/// GET /logout
///
/// Clears the privileged marker unconditionally and expires the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(token) = session_token(&jar) {
        state.sessions.remove(&token).await;
    }
    let expired = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(expired), Redirect::to("/researchers"))
}

/// Extract the session token from the cookie jar
fn session_token(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Admin-gate middleware for mutation and admin-listing routes.
///
/// Runs before the handler, so an anonymous caller is redirected to /login
/// with zero side effects (no database writes, no file writes).
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let ttl = Duration::seconds(state.config.session_ttl_seconds as i64);
    let privileged = match session_token(&jar) {
        Some(token) => state.sessions.is_privileged(&token, ttl).await,
        None => false,
    };

    if !privileged {
        return Redirect::to("/login").into_response();
    }

    next.run(request).await
}
