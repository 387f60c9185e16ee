use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

use super::DifficultyId;
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(TechId, Tech);
/// Name-keyed reference entity for a technique a map may require.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Tech {
    pub id: TechId,
    pub name: String,
    pub description: Option<String>,
    pub difficulty_id: DifficultyId,
}

/// A tech joined with the order of its default difficulty, as needed by
/// canonical-difficulty resolution.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TechWithDifficulty {
    pub id: TechId,
    pub name: String,
    pub difficulty_id: DifficultyId,
    pub difficulty_order: i16,
}

impl AppState {
    pub async fn get_tech(&self, id: TechId) -> AppResult<Tech> {
        sqlx::query_as::<_, Tech>(
            "SELECT id, name, description, difficulty_id FROM Tech WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::TechDoesNotExist)
    }

    pub async fn get_techs(&self, page_size: i64, page_number: i64) -> sqlx::Result<Vec<Tech>> {
        sqlx::query_as::<_, Tech>(
            "SELECT id, name, description, difficulty_id FROM Tech
                ORDER BY difficulty_id, name
                LIMIT $1 OFFSET $2
            ",
        )
        .bind(page_size)
        .bind(page_size * (page_number - 1))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_techs_with_difficulty(&self) -> sqlx::Result<Vec<TechWithDifficulty>> {
        sqlx::query_as::<_, TechWithDifficulty>(
            r#"SELECT t.id, t.name, t.difficulty_id, d."order" AS difficulty_order
                FROM Tech t
                JOIN Difficulty d ON d.id = t.difficulty_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
