use chrono::{DateTime, Utc};
use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

use super::{User, UserId};
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(TokenId, Token);
/// Bearer token for API authentication. Tokens are issued out of band.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Token {
    #[allow(unused)]
    pub id: TokenId, // stored in DB; never actually read by Rust code
    pub user_id: UserId,
    pub string: String,
    pub expiry: DateTime<Utc>,
}

impl Token {
    /// Returns whether the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiry
    }
}

impl AppState {
    /// Resolves the user behind a bearer token. `None` means the request was
    /// anonymous; an unknown or expired token is an error.
    pub async fn token_bearer(&self, token: Option<&str>) -> AppResult<Option<User>> {
        let Some(string) = token else {
            return Ok(None);
        };

        let token = sqlx::query_as::<_, Token>(
            "SELECT id, user_id, string, expiry FROM Token WHERE string = $1",
        )
        .bind(string)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InvalidToken)?;

        if token.is_expired() {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .get_user(token.user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok(Some(user))
    }
}
