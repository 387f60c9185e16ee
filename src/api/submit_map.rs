use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{MapId, ModId, User};
use crate::difficulty_tree::creations_from_rows;
use crate::error::AppError;
use crate::traits::Linkable;
use crate::{AppState, RequestBody};

use super::submit_mod::{map_creation_object, SubmissionReferenceData, SubmitMap};

/// Submit a single map to an existing mod. The map is resolved against the
/// mod's latest approved revision: its type decides which positional fields
/// are required, and its own difficulty set (if any) is what a
/// `mod_difficulty` claim is checked against.
#[derive(Deserialize)]
pub struct SubmitMapToMod {
    pub mod_id: ModId,
    #[serde(flatten)]
    pub map: SubmitMap,
}

#[derive(Serialize)]
pub struct SubmitMapResponse {
    pub id: MapId,
    pub url: String,
}

impl RequestBody for SubmitMapToMod {
    type Response = Json<SubmitMapResponse>;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;

        let raw = state.get_raw_mod(self.mod_id).await?;
        let detail = raw
            .details
            .first()
            .ok_or(AppError::NoModDetails(self.mod_id.0))?;

        let custom_difficulties = raw
            .difficulties
            .as_deref()
            .map(creations_from_rows)
            .unwrap_or_default();

        let reference = SubmissionReferenceData::fetch(&state).await?;
        let creation = map_creation_object(
            &state,
            self.map,
            Some(detail.revision),
            detail.mod_type,
            &reference,
            &custom_difficulties,
        )
        .await?;

        let approve = user.is_privileged();
        let map_id = state
            .add_map_to_mod(self.mod_id, creation, user.id, approve)
            .await?;

        Ok(Json(SubmitMapResponse {
            id: map_id,
            url: map_id.absolute_url(),
        }))
    }
}
