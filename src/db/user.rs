use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

use crate::AppState;

id_struct!(UserId, User);
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub permissions: Vec<String>,
}

impl User {
    /// Whether the user's submissions are approved immediately.
    pub fn is_privileged(&self) -> bool {
        self.permissions
            .iter()
            .any(|p| matches!(p.as_str(), "Super_Admin" | "Admin" | "Map_Moderator"))
    }
}

impl AppState {
    pub async fn get_user(&self, id: UserId) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, display_name, permissions FROM UserAccount WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
