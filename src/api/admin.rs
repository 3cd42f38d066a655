//! Admin listing and record mutation endpoints
//!
//! All routes here sit behind the admin gate; the session check runs in
//! middleware before any of these handlers, so an anonymous request never
//! reaches a database or file write.
//!
//! Create and edit accept the multipart form the directory front end
//! submits: scalar researcher fields, an optional photo file, and repeated
//! `profile_platform[]` / `profile_url[]` fields paired positionally.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::db::researchers::{ResearcherFields, ResearcherWithProfiles};
use crate::error::{Error, Result};
use crate::upload::{self, UploadedFile};
use crate::{db, AppState};

/// Raw multipart form content before validation
#[derive(Debug, Default)]
struct SubmittedForm {
    name: Option<String>,
    field: Option<String>,
    institution: Option<String>,
    email: Option<String>,
    bio: Option<String>,
    citation_count: Option<String>,
    publication_count: Option<String>,
    platforms: Vec<String>,
    urls: Vec<String>,
    photo: Option<UploadedFile>,
}

/// Drain the multipart body into a [`SubmittedForm`].
///
/// Unknown fields are read and dropped so a form with extra inputs still
/// parses. A photo part without a filename (browser behavior when no file
/// is chosen) counts as absent.
async fn read_form(multipart: &mut Multipart) -> Result<SubmittedForm> {
    let mut form = SubmittedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest(format!("failed to read photo: {}", e)))?;
                if !filename.is_empty() && !bytes.is_empty() {
                    form.photo = Some(UploadedFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "profile_platform[]" | "profile_platform" => {
                form.platforms.push(read_text(&name, field).await?);
            }
            "profile_url[]" | "profile_url" => {
                form.urls.push(read_text(&name, field).await?);
            }
            "name" => form.name = Some(read_text(&name, field).await?),
            "field" => form.field = Some(read_text(&name, field).await?),
            "institution" => form.institution = Some(read_text(&name, field).await?),
            "email" => form.email = Some(read_text(&name, field).await?),
            "bio" => form.bio = Some(read_text(&name, field).await?),
            "citation_count" => form.citation_count = Some(read_text(&name, field).await?),
            "publication_count" => form.publication_count = Some(read_text(&name, field).await?),
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

async fn read_text(name: &str, field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::BadRequest(format!("failed to read field '{}': {}", name, e)))
}

/// Blank counts default to 0; non-numeric or negative text is rejected.
fn parse_count(field: &str, raw: Option<&str>) -> Result<i64> {
    let trimmed = raw.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let value: i64 = trimmed.parse().map_err(|_| {
        Error::BadRequest(format!("{} must be a non-negative integer", field))
    })?;
    if value < 0 {
        return Err(Error::BadRequest(format!(
            "{} must be a non-negative integer",
            field
        )));
    }
    Ok(value)
}

/// Empty-after-trim optional text stores as NULL
fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validate the submitted scalar fields. The photo reference is decided by
/// the caller (create and edit differ there).
fn build_fields(form: &SubmittedForm) -> Result<ResearcherFields> {
    let name = form.name.as_deref().unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err(Error::BadRequest("name is required".to_string()));
    }

    Ok(ResearcherFields {
        name,
        field: optional_text(&form.field),
        institution: optional_text(&form.institution),
        email: optional_text(&form.email),
        bio: optional_text(&form.bio),
        citation_count: parse_count("citation_count", form.citation_count.as_deref())?,
        publication_count: parse_count("publication_count", form.publication_count.as_deref())?,
        photo: None,
    })
}

/// Pair platforms and urls positionally, trimming both halves. A pair is
/// kept only when both halves are non-empty; the rest are dropped without
/// an error.
fn profile_pairs(platforms: &[String], urls: &[String]) -> Vec<(String, String)> {
    platforms
        .iter()
        .zip(urls)
        .filter_map(|(platform, url)| {
            let platform = platform.trim();
            let url = url.trim();
            (!platform.is_empty() && !url.is_empty())
                .then(|| (platform.to_string(), url.to_string()))
        })
        .collect()
}

/// GET /admin
///
/// Full directory listing, always unfiltered, same shape as the public
/// listing.
pub async fn admin_listing(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResearcherWithProfiles>>> {
    let rows = db::researchers::list_with_profiles(&state.db, None).await?;
    Ok(Json(rows))
}

/// GET /add
///
/// Empty form template for the external renderer.
pub async fn new_researcher_template() -> Json<Value> {
    Json(json!({
        "name": "",
        "field": "",
        "institution": "",
        "email": "",
        "bio": "",
        "citation_count": 0,
        "publication_count": 0,
        "photo": null,
        "profiles": [],
    }))
}

/// POST /add
///
/// Creates a researcher plus its valid profile pairs in one transaction and
/// returns the generated id. Field validation runs before the photo write
/// so a rejected form leaves no file behind.
pub async fn create_researcher(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    let form = read_form(&mut multipart).await?;
    let mut fields = build_fields(&form)?;
    let pairs = profile_pairs(&form.platforms, &form.urls);

    fields.photo = upload::store_photo(
        &state.config.upload_dir,
        &state.config.allowed_extensions,
        form.photo.as_ref(),
    )
    .await?;

    let id = db::researchers::insert_with_profiles(&state.db, &fields, &pairs).await?;
    info!("Created researcher {} ('{}')", id, fields.name);

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// GET /edit/{id}
///
/// Current record with profiles, for the edit form. 404 when the id is
/// unknown.
pub async fn edit_researcher_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ResearcherWithProfiles>> {
    db::researchers::get_with_profiles(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("researcher {}", id)))
}

/// POST /edit/{id}
///
/// Overwrites all scalar fields and replaces the whole profile set. The
/// stored photo reference survives unless a valid replacement file arrives;
/// an invalid or absent file changes nothing. 404 before any file write
/// when the id is unknown.
pub async fn update_researcher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let existing = db::researchers::get(&state.db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("researcher {}", id)))?;

    let form = read_form(&mut multipart).await?;
    let mut fields = build_fields(&form)?;
    let pairs = profile_pairs(&form.platforms, &form.urls);

    // Keep old photo if no new valid file
    fields.photo = match upload::store_photo(
        &state.config.upload_dir,
        &state.config.allowed_extensions,
        form.photo.as_ref(),
    )
    .await?
    {
        Some(stored) => Some(stored),
        None => existing.photo,
    };

    let updated = db::researchers::update_with_profiles(&state.db, id, &fields, &pairs).await?;
    if !updated {
        return Err(Error::NotFound(format!("researcher {}", id)));
    }
    info!("Updated researcher {} ('{}')", id, fields.name);

    Ok(Json(json!({ "id": id })))
}

/// GET /delete/{id}
///
/// Deletes the researcher and all of its profiles; an unknown id is a
/// silent no-op. Either way the caller lands back on the admin listing.
pub async fn delete_researcher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    db::researchers::delete(&state.db, id).await?;
    info!("Deleted researcher {}", id);
    Ok(Redirect::to("/admin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_default_blank_to_zero() {
        assert_eq!(parse_count("citation_count", None).unwrap(), 0);
        assert_eq!(parse_count("citation_count", Some("")).unwrap(), 0);
        assert_eq!(parse_count("citation_count", Some("  ")).unwrap(), 0);
        assert_eq!(parse_count("citation_count", Some("5")).unwrap(), 5);
    }

    #[test]
    fn counts_reject_malformed_and_negative() {
        assert!(parse_count("citation_count", Some("many")).is_err());
        assert!(parse_count("citation_count", Some("3.5")).is_err());
        assert!(parse_count("citation_count", Some("-1")).is_err());
    }

    #[test]
    fn pairs_need_both_halves() {
        let platforms = vec![
            "ORCID".to_string(),
            "".to_string(),
            "  ".to_string(),
            "LinkedIn".to_string(),
        ];
        let urls = vec![
            "http://x".to_string(),
            "http://y".to_string(),
            "http://z".to_string(),
            "  ".to_string(),
        ];

        let pairs = profile_pairs(&platforms, &urls);
        assert_eq!(pairs, vec![("ORCID".to_string(), "http://x".to_string())]);
    }

    #[test]
    fn pairs_are_trimmed_and_positional() {
        let platforms = vec!["  ORCID  ".to_string(), "LinkedIn".to_string()];
        let urls = vec![" http://x ".to_string(), "http://y".to_string()];

        let pairs = profile_pairs(&platforms, &urls);
        assert_eq!(
            pairs,
            vec![
                ("ORCID".to_string(), "http://x".to_string()),
                ("LinkedIn".to_string(), "http://y".to_string()),
            ]
        );
    }

    #[test]
    fn name_is_required() {
        let form = SubmittedForm {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(build_fields(&form).is_err());

        let form = SubmittedForm {
            name: Some("Sok Kou".to_string()),
            field: Some("".to_string()),
            ..Default::default()
        };
        let fields = build_fields(&form).unwrap();
        assert_eq!(fields.name, "Sok Kou");
        // Blank optional text stores as NULL
        assert_eq!(fields.field, None);
    }
}
