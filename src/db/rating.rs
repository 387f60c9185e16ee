use chrono::{DateTime, Utc};
use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

use super::{DifficultyId, MapId, User};
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(RatingId, Rating);

/// One user's rating of a map. At least one of `quality` and `difficulty_id`
/// is always present.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub id: RatingId,
    pub map_id: MapId,
    pub user_id: super::UserId,
    pub quality: Option<i16>,
    pub difficulty_id: Option<DifficultyId>,
    pub time_submitted: DateTime<Utc>,
}

/// Aggregate quality over all ratings of one map.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub map_id: MapId,
    pub count: i64,
    pub average_quality: Option<f64>,
}

impl AppState {
    /// Records or replaces a user's rating of a map.
    pub async fn rate_map(
        &self,
        user: &User,
        map_id: MapId,
        quality: Option<i16>,
        difficulty_id: Option<DifficultyId>,
    ) -> AppResult<Rating> {
        if quality.is_none() && difficulty_id.is_none() {
            return Err(AppError::EmptyRating);
        }

        let map: Option<(MapId,)> = sqlx::query_as("SELECT id FROM Map WHERE id = $1")
            .bind(map_id)
            .fetch_optional(&self.pool)
            .await?;
        map.ok_or(AppError::MapDoesNotExist)?;

        let rating = sqlx::query_as::<_, Rating>(
            "INSERT INTO Rating (map_id, user_id, quality, difficulty_id, time_submitted)
                VALUES ($1, $2, $3, $4, now())
                ON CONFLICT (map_id, user_id) DO UPDATE
                    SET quality = excluded.quality,
                        difficulty_id = excluded.difficulty_id,
                        time_submitted = excluded.time_submitted
                RETURNING *
            ",
        )
        .bind(map_id)
        .bind(user.id)
        .bind(quality)
        .bind(difficulty_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(?map_id, user_id = ?user.id, "Rating recorded.");

        Ok(rating)
    }

    pub async fn get_map_rating_summary(&self, map_id: MapId) -> AppResult<RatingSummary> {
        let map: Option<(MapId,)> = sqlx::query_as("SELECT id FROM Map WHERE id = $1")
            .bind(map_id)
            .fetch_optional(&self.pool)
            .await?;
        map.ok_or(AppError::MapDoesNotExist)?;

        let summary = sqlx::query_as::<_, RatingSummary>(
            "SELECT $1::integer AS map_id,
                    COUNT(*) AS count,
                    AVG(quality)::double precision AS average_quality
                FROM Rating WHERE map_id = $1
            ",
        )
        .bind(map_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}
