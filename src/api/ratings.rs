use axum::Json;
use serde::Deserialize;

use crate::db::{DifficultyId, MapId, Rating, RatingSummary, User};
use crate::error::AppError;
use crate::{AppState, RequestBody};

/// Record or replace the calling user's rating of a map. At least one of
/// `quality` and `difficulty_id` must be given.
#[derive(Deserialize)]
pub struct RateMap {
    pub map_id: MapId,
    pub quality: Option<i16>,
    pub difficulty_id: Option<DifficultyId>,
}

impl RequestBody for RateMap {
    type Response = Json<Rating>;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let rating = state
            .rate_map(&user, self.map_id, self.quality, self.difficulty_id)
            .await?;
        Ok(Json(rating))
    }
}

#[derive(Deserialize)]
pub struct GetMapRatingSummary {
    pub map_id: MapId,
}

impl RequestBody for GetMapRatingSummary {
    type Response = Json<RatingSummary>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.get_map_rating_summary(self.map_id).await?))
    }
}
