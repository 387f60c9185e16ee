use chrono::{DateTime, Utc};
use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};

use super::{DifficultyId, LengthId, ModId, ModType, TechId, UserId};
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(MapId, "map");
impl crate::traits::Linkable for MapId {
    fn relative_url(&self) -> String {
        format!("/map?id={}", self.0)
    }
}

/// A tech reference on a map detail revision, as read for formatting.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct MapTechRef {
    pub name: String,
    pub full_clear_only: bool,
}

/// One detail revision of a map, with reference names joined in.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct RawMapDetails {
    pub details_id: i32,
    pub revision: i32,
    pub name: String,
    pub canonical_difficulty: String,
    pub length: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub removed_from_mod: bool,
    pub chapter: Option<i16>,
    pub side: Option<String>,
    pub mod_difficulty: Option<String>,
    pub overall_rank: Option<i16>,
    pub mapper_user_id: Option<UserId>,
    pub mapper_user_name: Option<String>,
    pub mapper_name: Option<String>,
    #[sqlx(skip)]
    pub techs: Vec<MapTechRef>,
}

/// A map with the detail revisions selected for a read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMap {
    pub id: MapId,
    pub mod_id: ModId,
    pub minimum_mod_revision: i32,
    pub details: Vec<RawMapDetails>,
}

/// Creation-ready object for one map, produced by submission assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapCreation {
    pub minimum_mod_revision: i32,
    pub details: MapDetailsCreation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDetailsCreation {
    pub name: String,
    pub canonical_difficulty_id: DifficultyId,
    pub length_id: LengthId,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub removed_from_mod: bool,
    pub chapter: Option<i16>,
    pub side: Option<String>,
    pub mod_difficulty_id: Option<DifficultyId>,
    pub overall_rank: Option<i16>,
    pub mapper_user_id: Option<UserId>,
    pub mapper_name: Option<String>,
    pub techs: Vec<MapTechCreation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapTechCreation {
    pub tech_id: TechId,
    pub full_clear_only: bool,
}

const RAW_MAP_DETAILS_SELECT: &str = "
    SELECT md.id AS details_id, md.revision, md.name,
            cd.name AS canonical_difficulty,
            l.name AS length,
            md.description, md.notes, md.removed_from_mod,
            md.chapter, md.side,
            mdiff.name AS mod_difficulty,
            md.overall_rank,
            md.mapper_user_id, u.display_name AS mapper_user_name, md.mapper_name
        FROM MapDetails md
        JOIN Difficulty cd ON cd.id = md.canonical_difficulty_id
        JOIN MapLength l ON l.id = md.length_id
        LEFT JOIN Difficulty mdiff ON mdiff.id = md.mod_difficulty_id
        LEFT JOIN UserAccount u ON u.id = md.mapper_user_id
        WHERE md.map_id = $1
";

impl AppState {
    /// Returns a map's raw view (latest approved detail revision) together
    /// with the owning mod's type.
    pub async fn get_raw_map(&self, id: MapId) -> AppResult<(RawMap, ModType)> {
        let row: Option<(MapId, ModId, i32)> =
            sqlx::query_as("SELECT id, mod_id, minimum_mod_revision FROM Map WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let (id, mod_id, minimum_mod_revision) = row.ok_or(AppError::MapDoesNotExist)?;

        let mod_type: Option<(ModType,)> = sqlx::query_as(
            "SELECT type FROM ModDetails
                WHERE mod_id = $1 AND time_approved IS NOT NULL
                ORDER BY revision DESC LIMIT 1
            ",
        )
        .bind(mod_id)
        .fetch_optional(&self.pool)
        .await?;
        let (mod_type,) = mod_type.ok_or(AppError::NoModDetails(mod_id.0))?;

        let details = self.get_raw_map_details(id, true).await?;

        Ok((
            RawMap {
                id,
                mod_id,
                minimum_mod_revision,
                details,
            },
            mod_type,
        ))
    }

    /// Returns the raw views of a mod's maps. With `approved_only`, maps that
    /// have no approved detail revision are left out entirely.
    pub(crate) async fn get_raw_maps_for_mod(
        &self,
        mod_id: ModId,
        approved_only: bool,
    ) -> AppResult<Vec<RawMap>> {
        let rows: Vec<(MapId, ModId, i32)> =
            sqlx::query_as("SELECT id, mod_id, minimum_mod_revision FROM Map WHERE mod_id = $1")
                .bind(mod_id)
                .fetch_all(&self.pool)
                .await?;

        let mut maps = Vec::with_capacity(rows.len());
        for (id, mod_id, minimum_mod_revision) in rows {
            let details = self.get_raw_map_details(id, approved_only).await?;
            if approved_only && details.is_empty() {
                continue;
            }
            maps.push(RawMap {
                id,
                mod_id,
                minimum_mod_revision,
                details,
            });
        }

        Ok(maps)
    }

    async fn get_raw_map_details(
        &self,
        map_id: MapId,
        approved_only: bool,
    ) -> AppResult<Vec<RawMapDetails>> {
        let sql = if approved_only {
            format!(
                "{RAW_MAP_DETAILS_SELECT} AND md.time_approved IS NOT NULL
                    ORDER BY md.revision DESC LIMIT 1"
            )
        } else {
            format!("{RAW_MAP_DETAILS_SELECT} ORDER BY md.revision DESC")
        };

        let mut details = sqlx::query_as::<_, RawMapDetails>(&sql)
            .bind(map_id)
            .fetch_all(&self.pool)
            .await?;

        for detail in &mut details {
            detail.techs = sqlx::query_as::<_, MapTechRef>(
                "SELECT t.name, mt.full_clear_only
                    FROM MapToTech mt
                    JOIN Tech t ON t.id = mt.tech_id
                    WHERE mt.map_details_id = $1
                    ORDER BY t.name
                ",
            )
            .bind(detail.details_id)
            .fetch_all(&self.pool)
            .await?;
        }

        Ok(details)
    }

    /// Adds a map to an existing mod. Used by the standalone map submission
    /// endpoint; mod submission inserts its maps in the same transaction as
    /// the mod itself.
    pub async fn add_map_to_mod(
        &self,
        mod_id: ModId,
        creation: MapCreation,
        submitted_by: UserId,
        approve: bool,
    ) -> AppResult<MapId> {
        let mut transaction = self.pool.begin().await?;
        let map_id = insert_map(&mut transaction, mod_id, &creation, submitted_by, approve).await?;
        transaction.commit().await?;

        tracing::info!(?mod_id, ?map_id, user_id = ?submitted_by, "Map submission added.");

        Ok(map_id)
    }
}

/// Persists one map creation object: the identity row, detail revision 1, and
/// the tech links.
pub(crate) async fn insert_map(
    transaction: &mut Transaction<'_, Postgres>,
    mod_id: ModId,
    creation: &MapCreation,
    submitted_by: UserId,
    approve: bool,
) -> sqlx::Result<MapId> {
    let time_approved: Option<DateTime<Utc>> = approve.then(Utc::now);
    let approved_by: Option<UserId> = approve.then_some(submitted_by);

    let (map_id,): (MapId,) = sqlx::query_as(
        "INSERT INTO Map (mod_id, minimum_mod_revision) VALUES ($1, $2) RETURNING id",
    )
    .bind(mod_id)
    .bind(creation.minimum_mod_revision)
    .fetch_one(&mut **transaction)
    .await?;

    let details = &creation.details;
    let (details_id,): (i32,) = sqlx::query_as(
        "INSERT INTO MapDetails
                (map_id, revision, name, canonical_difficulty_id, length_id,
                description, notes, removed_from_mod,
                chapter, side, mod_difficulty_id, overall_rank,
                mapper_user_id, mapper_name,
                submitted_by, time_approved, approved_by)
            VALUES ($1, 1, $2, $3, $4,
                    $5, $6, $7,
                    $8, $9, $10, $11,
                    $12, $13,
                    $14, $15, $16)
            RETURNING id
        ",
    )
    .bind(map_id)
    .bind(&details.name)
    .bind(details.canonical_difficulty_id)
    .bind(details.length_id)
    .bind(&details.description)
    .bind(&details.notes)
    .bind(details.removed_from_mod)
    .bind(details.chapter)
    .bind(&details.side)
    .bind(details.mod_difficulty_id)
    .bind(details.overall_rank)
    .bind(details.mapper_user_id)
    .bind(&details.mapper_name)
    .bind(submitted_by)
    .bind(time_approved)
    .bind(approved_by)
    .fetch_one(&mut **transaction)
    .await?;

    for tech in &details.techs {
        sqlx::query(
            "INSERT INTO MapToTech (map_details_id, tech_id, full_clear_only)
                VALUES ($1, $2, $3)
            ",
        )
        .bind(details_id)
        .bind(tech.tech_id)
        .bind(tech.full_clear_only)
        .execute(&mut **transaction)
        .await?;
    }

    Ok(map_id)
}
