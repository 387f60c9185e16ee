use derive_more::{From, Into};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};

use super::ModId;
use crate::difficulty_tree::ParentDifficultyCreation;
use crate::AppState;

id_struct!(DifficultyId, Difficulty);
/// A difficulty row.
///
/// `parent_mod_id` is `NULL` for the default difficulty set; for a mod's
/// custom set it points at the owning mod. `parent_difficulty_id` is `NULL`
/// for top-level difficulties. `order` is the 1-based position among siblings.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Difficulty {
    pub id: DifficultyId,
    pub name: String,
    pub parent_mod_id: Option<ModId>,
    pub parent_difficulty_id: Option<DifficultyId>,
    pub order: i16,
}

/// A top-level difficulty with its children, both from the default set.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DifficultyWithChildren {
    #[serde(flatten)]
    pub difficulty: Difficulty,
    pub children: Vec<Difficulty>,
}

impl AppState {
    /// Returns the top-level difficulties of the default set, by ascending
    /// order.
    pub async fn get_default_parent_difficulties(&self) -> sqlx::Result<Vec<Difficulty>> {
        sqlx::query_as::<_, Difficulty>(
            r#"SELECT id, name, parent_mod_id, parent_difficulty_id, "order"
                FROM Difficulty
                WHERE parent_mod_id IS NULL AND parent_difficulty_id IS NULL
                ORDER BY "order"
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Returns the default difficulty set as parents with their children.
    pub async fn get_default_difficulty_tree(&self) -> sqlx::Result<Vec<DifficultyWithChildren>> {
        let parents = self.get_default_parent_difficulties().await?;

        let children = sqlx::query_as::<_, Difficulty>(
            r#"SELECT id, name, parent_mod_id, parent_difficulty_id, "order"
                FROM Difficulty
                WHERE parent_mod_id IS NULL AND parent_difficulty_id IS NOT NULL
                ORDER BY "order"
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut children_by_parent = children
            .into_iter()
            .into_group_map_by(|d| d.parent_difficulty_id);

        Ok(parents
            .into_iter()
            .map(|parent| DifficultyWithChildren {
                children: children_by_parent
                    .remove(&Some(parent.id))
                    .unwrap_or_default(),
                difficulty: parent,
            })
            .collect())
    }

    /// Returns the highest difficulty id currently in use, or 0 if there are
    /// none. Seeds the id allocation of the difficulty-tree builder.
    pub async fn get_highest_difficulty_id(&self) -> sqlx::Result<i32> {
        let row: (i32,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) FROM Difficulty")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Returns a mod's custom difficulty set, or an empty list if the mod
    /// uses the default set.
    pub async fn get_mod_difficulties(&self, mod_id: ModId) -> sqlx::Result<Vec<Difficulty>> {
        sqlx::query_as::<_, Difficulty>(
            r#"SELECT id, name, parent_mod_id, parent_difficulty_id, "order"
                FROM Difficulty
                WHERE parent_mod_id = $1
            "#,
        )
        .bind(mod_id)
        .fetch_all(&self.pool)
        .await
    }
}

/// Persists the creation records produced by the difficulty-tree builder.
///
/// Parents are inserted before their children so the foreign keys resolve.
pub(crate) async fn insert_difficulty_tree(
    transaction: &mut Transaction<'_, Postgres>,
    parent_mod_id: Option<ModId>,
    creations: &[ParentDifficultyCreation],
) -> sqlx::Result<()> {
    for parent in creations {
        sqlx::query(
            r#"INSERT INTO Difficulty (id, name, parent_mod_id, parent_difficulty_id, "order")
                VALUES ($1, $2, $3, NULL, $4)
            "#,
        )
        .bind(parent.id)
        .bind(&parent.name)
        .bind(parent_mod_id)
        .bind(parent.order)
        .execute(&mut **transaction)
        .await?;

        for child in &parent.children {
            sqlx::query(
                r#"INSERT INTO Difficulty (id, name, parent_mod_id, parent_difficulty_id, "order")
                    VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(child.id)
            .bind(&child.name)
            .bind(parent_mod_id)
            .bind(parent.id)
            .bind(child.order)
            .execute(&mut **transaction)
            .await?;
        }
    }

    Ok(())
}
