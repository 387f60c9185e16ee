use chrono::{DateTime, Utc};
use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

use super::map::{insert_map, MapCreation, RawMap};
use super::publisher::{connect_publisher, PublisherConnection};
use super::{Difficulty, PublisherId, UserId};
use crate::difficulty_tree::ParentDifficultyCreation;
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(ModId, "mod");
impl crate::traits::Linkable for ModId {
    fn relative_url(&self) -> String {
        format!("/mod?id={}", self.0)
    }
}

/// Kinds of mods. Which map fields are mandatory and which are surfaced by
/// the formatter depends on this.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[sqlx(type_name = "mod_type", rename_all = "lowercase")]
pub enum ModType {
    Normal,
    Collab,
    Contest,
    Lobby,
}

/// One detail revision of a mod, with the publisher's platform id joined in.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct RawModDetails {
    pub revision: i32,
    pub mod_type: ModType,
    pub name: String,
    pub publisher_id: PublisherId,
    pub publisher_platform_id: Option<i64>,
    pub content_warning: bool,
    pub notes: Option<String>,
    pub short_description: String,
    pub long_description: Option<String>,
    pub platform_mod_id: Option<i64>,
}

/// A mod with the detail revisions and maps selected for a read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMod {
    pub id: ModId,
    /// Custom difficulty rows, when the mod defines its own set.
    pub difficulties: Option<Vec<Difficulty>>,
    pub details: Vec<RawModDetails>,
    pub maps: Vec<RawMap>,
}

/// Everything needed to persist a new mod in one transaction.
pub struct ModCreation {
    pub mod_type: ModType,
    pub name: String,
    pub publisher: PublisherConnection,
    pub content_warning: bool,
    pub notes: Option<String>,
    pub short_description: String,
    pub long_description: Option<String>,
    pub platform_mod_id: Option<i64>,
    pub difficulties: Vec<ParentDifficultyCreation>,
    pub maps: Vec<MapCreation>,
    pub submitted_by: UserId,
    pub approve: bool,
}

const RAW_MOD_DETAILS_SELECT: &str = "
    SELECT d.revision, d.type AS mod_type, d.name,
            d.publisher_id, p.platform_member_id AS publisher_platform_id,
            d.content_warning, d.notes, d.short_description, d.long_description,
            d.platform_mod_id
        FROM ModDetails d
        JOIN Publisher p ON p.id = d.publisher_id
        WHERE d.mod_id = $1
";

impl AppState {
    /// Returns the public raw view of a mod: its latest approved detail
    /// revision and the latest approved revision of each of its maps.
    pub async fn get_raw_mod(&self, id: ModId) -> AppResult<RawMod> {
        self.check_mod_exists(id).await?;

        let details = sqlx::query_as::<_, RawModDetails>(&format!(
            "{RAW_MOD_DETAILS_SELECT} AND d.time_approved IS NOT NULL
                ORDER BY d.revision DESC LIMIT 1"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        self.assemble_raw_mod(id, details, true).await
    }

    /// Returns the raw view of one specific detail revision of a mod,
    /// approved or not. Maps are included regardless of approval.
    pub async fn get_raw_mod_revision(&self, id: ModId, revision: i32) -> AppResult<RawMod> {
        self.check_mod_exists(id).await?;

        let details = sqlx::query_as::<_, RawModDetails>(&format!(
            "{RAW_MOD_DETAILS_SELECT} AND d.revision = $2"
        ))
        .bind(id)
        .bind(revision)
        .fetch_all(&self.pool)
        .await?;
        let details = require_revision(details, id, revision)?;

        self.assemble_raw_mod(id, details, false).await
    }

    async fn check_mod_exists(&self, id: ModId) -> AppResult {
        let row: Option<(ModId,)> = sqlx::query_as("SELECT id FROM Mod WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or(AppError::ModDoesNotExist)?;
        Ok(())
    }

    async fn assemble_raw_mod(
        &self,
        id: ModId,
        details: Vec<RawModDetails>,
        approved_maps_only: bool,
    ) -> AppResult<RawMod> {
        let difficulties = self.get_mod_difficulties(id).await?;
        let maps = self.get_raw_maps_for_mod(id, approved_maps_only).await?;

        Ok(RawMod {
            id,
            difficulties: (!difficulties.is_empty()).then_some(difficulties),
            details,
            maps,
        })
    }

    /// All ids of mods that have at least one approved detail revision.
    pub async fn get_mod_ids(&self) -> sqlx::Result<Vec<ModId>> {
        let rows: Vec<(ModId,)> = sqlx::query_as(
            "SELECT DISTINCT d.mod_id FROM ModDetails d
                WHERE d.time_approved IS NOT NULL
                ORDER BY d.mod_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Persists a whole mod submission: the identity row, any custom
    /// difficulty tree, the publisher connection, detail revision 1, and all
    /// maps, in one transaction.
    pub async fn create_mod(&self, data: ModCreation) -> AppResult<ModId> {
        let time_approved: Option<DateTime<Utc>> = data.approve.then(Utc::now);
        let approved_by: Option<UserId> = data.approve.then_some(data.submitted_by);

        let mut transaction = self.pool.begin().await?;

        let (mod_id,): (ModId,) =
            sqlx::query_as("INSERT INTO Mod DEFAULT VALUES RETURNING id")
                .fetch_one(&mut *transaction)
                .await?;

        super::insert_difficulty_tree(&mut transaction, Some(mod_id), &data.difficulties).await?;

        let publisher_id = connect_publisher(&mut transaction, data.publisher).await?;

        sqlx::query(
            "INSERT INTO ModDetails
                    (mod_id, revision, type, name, publisher_id,
                    content_warning, notes, short_description, long_description,
                    platform_mod_id,
                    submitted_by, time_approved, approved_by)
                VALUES ($1, 1, $2, $3, $4,
                        $5, $6, $7, $8,
                        $9,
                        $10, $11, $12)
            ",
        )
        .bind(mod_id)
        .bind(data.mod_type)
        .bind(&data.name)
        .bind(publisher_id)
        .bind(data.content_warning)
        .bind(&data.notes)
        .bind(&data.short_description)
        .bind(&data.long_description)
        .bind(data.platform_mod_id)
        .bind(data.submitted_by)
        .bind(time_approved)
        .bind(approved_by)
        .execute(&mut *transaction)
        .await?;

        for map in &data.maps {
            insert_map(&mut transaction, mod_id, map, data.submitted_by, data.approve).await?;
        }

        transaction.commit().await?;

        tracing::info!(?mod_id, user_id = ?data.submitted_by, "Mod submission added.");

        Ok(mod_id)
    }
}

/// A revision query that matches no row is a client error, not a corrupt mod.
fn require_revision(
    details: Vec<RawModDetails>,
    id: ModId,
    revision: i32,
) -> AppResult<Vec<RawModDetails>> {
    if details.is_empty() {
        return Err(AppError::ModRevisionDoesNotExist {
            mod_id: id.0,
            revision,
        });
    }
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_revision_is_reported_against_the_mod() {
        let err = require_revision(Vec::new(), ModId(4), 9).unwrap_err();
        assert!(matches!(
            err,
            AppError::ModRevisionDoesNotExist {
                mod_id: 4,
                revision: 9,
            }
        ));
    }

    #[test]
    fn present_revision_passes_through() {
        let details = vec![RawModDetails {
            revision: 2,
            mod_type: ModType::Normal,
            name: "Glacier".to_string(),
            publisher_id: PublisherId(1),
            publisher_platform_id: Some(77),
            content_warning: false,
            notes: None,
            short_description: "An icy mod".to_string(),
            long_description: None,
            platform_mod_id: None,
        }];
        let passed = require_revision(details.clone(), ModId(4), 2).unwrap();
        assert_eq!(passed, details);
    }
}
