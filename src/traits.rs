use axum::extract::{Json, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;

use crate::db::User;
use crate::error::AppError;
use crate::AppState;

/// Object that has a URL on this site.
pub trait Linkable {
    /// Returns the relative URL. Example: `/map?id=3`
    fn relative_url(&self) -> String;

    /// Returns the absolute URL. Example: `https://mods.example.com/map?id=3`
    fn absolute_url(&self) -> String {
        crate::env::DOMAIN.clone() + &self.relative_url()
    }
}

/// Extracts the bearer token from an `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Object that can be received as a request.
pub trait RequestBody {
    type Response;

    async fn request(self, state: AppState, user: Option<User>)
        -> Result<Self::Response, AppError>;

    async fn as_handler_query(
        State(state): State<AppState>,
        headers: HeaderMap,
        Query(item): Query<Self>,
    ) -> Result<impl IntoResponse, AppError>
    where
        Self: Sized + DeserializeOwned,
        Self::Response: IntoResponse,
    {
        let user = state.token_bearer(bearer_token(&headers)).await?;
        item.request(state, user).await
    }

    async fn as_json_handler(
        State(state): State<AppState>,
        headers: HeaderMap,
        Json(item): Json<Self>,
    ) -> Result<impl IntoResponse, AppError>
    where
        Self: Sized + DeserializeOwned,
        Self::Response: IntoResponse,
    {
        let user = state.token_bearer(bearer_token(&headers)).await?;
        item.request(state, user).await
    }
}
