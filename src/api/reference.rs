//! Read endpoints for the reference sets: the default difficulty tree, the
//! length scale, and the tech list.

use axum::Json;
use serde::Deserialize;

use crate::db::{DifficultyWithChildren, MapLength, Tech, TechId, User};
use crate::error::AppError;
use crate::{AppState, RequestBody};

#[derive(Deserialize)]
pub struct ListDifficulties {}

impl RequestBody for ListDifficulties {
    type Response = Json<Vec<DifficultyWithChildren>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.get_default_difficulty_tree().await?))
    }
}

#[derive(Deserialize)]
pub struct ListLengths {}

impl RequestBody for ListLengths {
    type Response = Json<Vec<MapLength>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.get_map_lengths().await?))
    }
}

#[derive(Deserialize)]
pub struct GetTech {
    pub id: TechId,
}

impl RequestBody for GetTech {
    type Response = Json<Tech>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.get_tech(self.id).await?))
    }
}

#[derive(Deserialize)]
pub struct ListTechs {
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_page_number")]
    pub page_number: i64,
}

fn default_page_size() -> i64 {
    50
}

fn default_page_number() -> i64 {
    1
}

impl RequestBody for ListTechs {
    type Response = Json<Vec<Tech>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.get_techs(self.page_size, self.page_number).await?))
    }
}
