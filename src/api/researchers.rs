//! Public search and browse endpoints

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::researchers::ResearcherWithProfiles;
use crate::error::Result;
use crate::{db, AppState};

/// Query parameters for the public listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Free-text filter; blank or absent returns the full directory
    pub q: Option<String>,
}

/// GET /researchers?q=
///
/// Public listing. With `q`, returns researchers whose name, field, or
/// institution contains the query as a case-insensitive substring; each row
/// carries its full profile list, ordered by id.
pub async fn list_researchers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ResearcherWithProfiles>>> {
    let filter = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let rows = db::researchers::list_with_profiles(&state.db, filter).await?;
    Ok(Json(rows))
}
