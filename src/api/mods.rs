use axum::Json;
use serde::Deserialize;

use crate::db::{ModId, User};
use crate::error::AppError;
use crate::format::{format_mod, FormattedMod};
use crate::{AppState, RequestBody};

/// Read one mod: its latest approved revision by default, or one specific
/// revision (approved or not) when `revision` is given.
#[derive(Deserialize)]
pub struct GetMod {
    pub id: ModId,
    pub revision: Option<i32>,
}

impl RequestBody for GetMod {
    type Response = Json<Vec<FormattedMod>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let raw = match self.revision {
            None => state.get_raw_mod(self.id).await?,
            Some(revision) => state.get_raw_mod_revision(self.id, revision).await?,
        };
        Ok(Json(format_mod(&raw)?))
    }
}

/// List every mod that has an approved revision.
#[derive(Deserialize)]
pub struct ListMods {}

impl RequestBody for ListMods {
    type Response = Json<Vec<FormattedMod>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let mut mods = Vec::new();
        for id in state.get_mod_ids().await? {
            let raw = state.get_raw_mod(id).await?;
            mods.extend(format_mod(&raw)?);
        }
        Ok(Json(mods))
    }
}
