use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

use crate::AppState;

id_struct!(LengthId, MapLength);
/// Reference entry for how long a map takes to play through.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MapLength {
    pub id: LengthId,
    pub name: String,
    pub description: String,
    pub order: i16,
}

impl AppState {
    pub async fn get_map_lengths(&self) -> sqlx::Result<Vec<MapLength>> {
        sqlx::query_as::<_, MapLength>(
            r#"SELECT id, name, description, "order" FROM MapLength ORDER BY "order""#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
