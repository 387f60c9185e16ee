use axum::Json;
use serde::Deserialize;

use crate::db::{MapId, User};
use crate::error::AppError;
use crate::format::{format_map, FormattedMap};
use crate::{AppState, RequestBody};

/// Read one map's latest approved revision, formatted under its owning mod's
/// current type.
#[derive(Deserialize)]
pub struct GetMap {
    pub id: MapId,
}

impl RequestBody for GetMap {
    type Response = Json<Vec<FormattedMap>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let (raw, mod_type) = state.get_raw_map(self.id).await?;
        Ok(Json(format_map(&raw, mod_type)?))
    }
}
