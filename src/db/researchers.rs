//! Researcher and research-profile queries
//!
//! Every multi-statement logical operation (insert with profiles, edit with
//! profile replacement, delete with dependents) runs inside one transaction:
//! readers never observe a half-updated profile set.

use crate::error::Result;
use serde::Serialize;
use sqlx::SqlitePool;

/// Directory entry for a single researcher
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Researcher {
    pub id: i64,
    pub name: String,
    pub field: Option<String>,
    pub institution: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub citation_count: i64,
    pub publication_count: i64,
    /// Stored filename of the uploaded photo, if any
    pub photo: Option<String>,
}

/// External profile link (ORCID, LinkedIn, ...) owned by one researcher
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResearchProfile {
    pub id: i64,
    pub researcher_id: i64,
    pub platform: String,
    pub url: String,
}

/// Listing row: researcher plus all of its profile links
#[derive(Debug, Clone, Serialize)]
pub struct ResearcherWithProfiles {
    pub researcher: Researcher,
    pub profiles: Vec<ResearchProfile>,
}

/// Scalar fields accepted by insert and update
#[derive(Debug, Clone, Default)]
pub struct ResearcherFields {
    pub name: String,
    pub field: Option<String>,
    pub institution: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub citation_count: i64,
    pub publication_count: i64,
    pub photo: Option<String>,
}

/// Escape LIKE wildcards so the filter matches as a literal substring
fn like_pattern(filter: &str) -> String {
    let escaped = filter
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// List researchers with their profiles attached, ordered by id.
///
/// A filter matches case-insensitively as a substring of name, field, or
/// institution. `None` returns the full directory.
pub async fn list_with_profiles(
    db: &SqlitePool,
    filter: Option<&str>,
) -> Result<Vec<ResearcherWithProfiles>> {
    let researchers: Vec<Researcher> = match filter {
        Some(filter) => {
            let pattern = like_pattern(filter);
            sqlx::query_as(
                r#"
                SELECT * FROM researchers
                WHERE name LIKE ? ESCAPE '\'
                   OR field LIKE ? ESCAPE '\'
                   OR institution LIKE ? ESCAPE '\'
                ORDER BY id
                "#,
            )
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM researchers ORDER BY id")
                .fetch_all(db)
                .await?
        }
    };

    let mut rows = Vec::with_capacity(researchers.len());
    for researcher in researchers {
        let profiles = list_profiles(db, researcher.id).await?;
        rows.push(ResearcherWithProfiles {
            researcher,
            profiles,
        });
    }

    Ok(rows)
}

/// Fetch one researcher, or None if the id is unknown
pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<Researcher>> {
    let researcher = sqlx::query_as("SELECT * FROM researchers WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(researcher)
}

/// Fetch one researcher with its profiles, or None if the id is unknown
pub async fn get_with_profiles(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<ResearcherWithProfiles>> {
    let Some(researcher) = get(db, id).await? else {
        return Ok(None);
    };
    let profiles = list_profiles(db, id).await?;
    Ok(Some(ResearcherWithProfiles {
        researcher,
        profiles,
    }))
}

/// All profile links for one researcher, ordered by id
pub async fn list_profiles(db: &SqlitePool, researcher_id: i64) -> Result<Vec<ResearchProfile>> {
    let profiles = sqlx::query_as(
        "SELECT * FROM research_profiles WHERE researcher_id = ? ORDER BY id",
    )
    .bind(researcher_id)
    .fetch_all(db)
    .await?;
    Ok(profiles)
}

/// Insert a researcher and its profile links as one transaction.
///
/// Returns the generated researcher id.
pub async fn insert_with_profiles(
    db: &SqlitePool,
    fields: &ResearcherFields,
    profiles: &[(String, String)],
) -> Result<i64> {
    let mut tx = db.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO researchers
            (name, field, institution, email, bio, citation_count, publication_count, photo)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.field)
    .bind(&fields.institution)
    .bind(&fields.email)
    .bind(&fields.bio)
    .bind(fields.citation_count)
    .bind(fields.publication_count)
    .bind(&fields.photo)
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_rowid();

    for (platform, url) in profiles {
        sqlx::query("INSERT INTO research_profiles (researcher_id, platform, url) VALUES (?, ?, ?)")
            .bind(id)
            .bind(platform)
            .bind(url)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(id)
}

/// Overwrite a researcher's scalar fields and replace its whole profile set.
///
/// The submitted profiles fully replace the stored ones (delete + reinsert,
/// single transaction). Returns false when the id is unknown; nothing is
/// written in that case.
pub async fn update_with_profiles(
    db: &SqlitePool,
    id: i64,
    fields: &ResearcherFields,
    profiles: &[(String, String)],
) -> Result<bool> {
    let mut tx = db.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE researchers SET
            name = ?, field = ?, institution = ?, email = ?, bio = ?,
            citation_count = ?, publication_count = ?, photo = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.field)
    .bind(&fields.institution)
    .bind(&fields.email)
    .bind(&fields.bio)
    .bind(fields.citation_count)
    .bind(fields.publication_count)
    .bind(&fields.photo)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM research_profiles WHERE researcher_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    for (platform, url) in profiles {
        sqlx::query("INSERT INTO research_profiles (researcher_id, platform, url) VALUES (?, ?, ?)")
            .bind(id)
            .bind(platform)
            .bind(url)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Delete a researcher and all of its profile links.
///
/// Dependents are deleted explicitly rather than relying on the FK cascade
/// alone. An unknown id is a silent no-op.
pub async fn delete(db: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM research_profiles WHERE researcher_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM researchers WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_pool;

    fn fields(name: &str) -> ResearcherFields {
        ResearcherFields {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn pair(platform: &str, url: &str) -> (String, String) {
        (platform.to_string(), url.to_string())
    }

    #[tokio::test]
    async fn insert_attaches_profiles() {
        let (pool, _dir) = temp_pool().await;

        let id = insert_with_profiles(
            &pool,
            &fields("Sok Kou"),
            &[pair("ORCID", "http://x"), pair("LinkedIn", "http://y")],
        )
        .await
        .unwrap();

        let profiles = list_profiles(&pool, id).await.unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].platform, "ORCID");
        assert!(profiles.iter().all(|p| p.researcher_id == id));
    }

    #[tokio::test]
    async fn update_replaces_whole_profile_set() {
        let (pool, _dir) = temp_pool().await;

        let id = insert_with_profiles(
            &pool,
            &fields("Chenda Ly"),
            &[pair("ORCID", "http://a"), pair("ResearchGate", "http://b")],
        )
        .await
        .unwrap();

        let updated = update_with_profiles(
            &pool,
            id,
            &fields("Chenda Ly"),
            &[pair("Google Scholar", "http://c")],
        )
        .await
        .unwrap();
        assert!(updated);

        let profiles = list_profiles(&pool, id).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].platform, "Google Scholar");

        // Replacing with an empty set leaves no remnants
        let updated = update_with_profiles(&pool, id, &fields("Chenda Ly"), &[])
            .await
            .unwrap();
        assert!(updated);
        assert!(list_profiles(&pool, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_unknown_id_writes_nothing() {
        let (pool, _dir) = temp_pool().await;

        let updated = update_with_profiles(&pool, 42, &fields("Nobody"), &[pair("ORCID", "http://x")])
            .await
            .unwrap();
        assert!(!updated);

        let rows = list_with_profiles(&pool, None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_researcher_and_profiles() {
        let (pool, _dir) = temp_pool().await;

        let id = insert_with_profiles(&pool, &fields("Rithy Heng"), &[pair("ORCID", "http://x")])
            .await
            .unwrap();
        let other = insert_with_profiles(&pool, &fields("Dara Meas"), &[pair("ORCID", "http://y")])
            .await
            .unwrap();

        delete(&pool, id).await.unwrap();

        assert!(get(&pool, id).await.unwrap().is_none());
        assert!(list_profiles(&pool, id).await.unwrap().is_empty());
        // Unrelated rows are untouched
        assert_eq!(list_profiles(&pool, other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_no_op() {
        let (pool, _dir) = temp_pool().await;
        insert_with_profiles(&pool, &fields("Srey Phan"), &[]).await.unwrap();

        delete(&pool, 999).await.unwrap();

        assert_eq!(list_with_profiles(&pool, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn filter_matches_substring_across_columns() {
        let (pool, _dir) = temp_pool().await;

        insert_with_profiles(
            &pool,
            &ResearcherFields {
                name: "Sok Kou".to_string(),
                field: Some("AI, Robotics".to_string()),
                institution: Some("Royal University of Phnom Penh".to_string()),
                ..Default::default()
            },
            &[],
        )
        .await
        .unwrap();
        insert_with_profiles(
            &pool,
            &ResearcherFields {
                name: "Vannak Chhay".to_string(),
                field: Some("Networking".to_string()),
                institution: Some("University of Cambodia".to_string()),
                ..Default::default()
            },
            &[],
        )
        .await
        .unwrap();

        // Case-insensitive, matches inside a comma-separated field value
        let rows = list_with_profiles(&pool, Some("ai")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].researcher.name, "Sok Kou");

        // Institution column participates too
        let rows = list_with_profiles(&pool, Some("cambodia")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].researcher.name, "Vannak Chhay");

        let rows = list_with_profiles(&pool, Some("quantum")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn filter_wildcards_match_literally() {
        let (pool, _dir) = temp_pool().await;

        insert_with_profiles(&pool, &fields("100% Effort Lab"), &[])
            .await
            .unwrap();
        insert_with_profiles(&pool, &fields("Pich Ngin"), &[])
            .await
            .unwrap();

        // '%' in the query is not an SQL wildcard
        let rows = list_with_profiles(&pool, Some("100%")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].researcher.name, "100% Effort Lab");
    }

    #[tokio::test]
    async fn listing_preserves_insertion_order() {
        let (pool, _dir) = temp_pool().await;

        let first = insert_with_profiles(&pool, &fields("First"), &[]).await.unwrap();
        let second = insert_with_profiles(&pool, &fields("Second"), &[]).await.unwrap();

        let rows = list_with_profiles(&pool, None).await.unwrap();
        assert_eq!(
            rows.iter().map(|r| r.researcher.id).collect::<Vec<_>>(),
            vec![first, second]
        );
    }
}
