use eyre::Result;
use sqlx::query;

use crate::difficulty_tree::{build_difficulty_tree, DifficultyInput};
use crate::AppState;

impl AppState {
    pub async fn reset(&self) -> Result<()> {
        let mut transaction = self.pool.begin().await?;

        query("DROP SCHEMA public CASCADE")
            .execute(&mut *transaction)
            .await?;
        query("CREATE SCHEMA public")
            .execute(&mut *transaction)
            .await?;
        let _ = query("GRANT ALL ON SCHEMA public TO postgres")
            .execute(&mut *transaction)
            .await; // ok if this fails
        query("GRANT ALL ON SCHEMA public TO public")
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;
        Ok(())
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    /// Loads the default difficulty tree, the length scale, and a starter
    /// tech list. Safe to run on an already-seeded database.
    pub async fn seed(&self) -> Result<()> {
        self.seed_default_difficulties().await?;
        self.seed_lengths().await?;
        self.seed_techs().await?;
        Ok(())
    }

    async fn seed_default_difficulties(&self) -> Result<()> {
        if !self.get_default_parent_difficulties().await?.is_empty() {
            return Ok(());
        }

        let entries: Vec<DifficultyInput> =
            ["Beginner", "Intermediate", "Advanced", "Expert", "Grandmaster"]
                .into_iter()
                .map(|parent| DifficultyInput::Grouped {
                    parent: parent.to_string(),
                    children: vec!["Low".to_string(), "Mid".to_string(), "High".to_string()],
                })
                .collect();

        let highest = self.get_highest_difficulty_id().await?;
        let build = build_difficulty_tree(&entries, highest);

        let mut transaction = self.pool.begin().await?;
        for parent in &build.creations {
            query(
                "INSERT INTO Difficulty (id, name, parent_mod_id, parent_difficulty_id, \"order\")
                    VALUES ($1, $2, NULL, NULL, $3)
                ",
            )
            .bind(parent.id)
            .bind(&parent.name)
            .bind(parent.order)
            .execute(&mut *transaction)
            .await?;
            for child in &parent.children {
                query(
                    "INSERT INTO Difficulty (id, name, parent_mod_id, parent_difficulty_id, \"order\")
                        VALUES ($1, $2, NULL, $3, $4)
                    ",
                )
                .bind(child.id)
                .bind(&child.name)
                .bind(parent.id)
                .bind(child.order)
                .execute(&mut *transaction)
                .await?;
            }
        }
        transaction.commit().await?;
        Ok(())
    }

    async fn seed_lengths(&self) -> Result<()> {
        let mut transaction = self.pool.begin().await?;
        for (name, description, order) in [
            ("Short", "Less than 10 minutes", 1i16),
            ("Medium", "10 to 30 minutes", 2),
            ("Long", "More than 30 minutes", 3),
        ] {
            query(
                "INSERT INTO MapLength (name, description, \"order\")
                    VALUES ($1, $2, $3)
                    ON CONFLICT DO NOTHING
                ",
            )
            .bind(name)
            .bind(description)
            .bind(order)
            .execute(&mut *transaction)
            .await?;
        }
        transaction.commit().await?;
        Ok(())
    }

    async fn seed_techs(&self) -> Result<()> {
        let mut transaction = self.pool.begin().await?;
        for (name, description, difficulty_name) in [
            ("Wavedash", "Convert a dash into height and speed", "Intermediate"),
            ("Hyperdash", "A low, fast extended dash", "Intermediate"),
            ("Wallbounce", "Redirect upward off a wall mid-dash", "Advanced"),
            ("Demodash", "Clip through spinners with a crouched dash", "Expert"),
            ("Ultradash", "Chain a hyper into a diagonal for extra speed", "Expert"),
        ] {
            query(
                "INSERT INTO Tech (name, description, difficulty_id)
                    SELECT $1, $2, Difficulty.id
                        FROM Difficulty
                        WHERE Difficulty.name = $3
                            AND Difficulty.parent_mod_id IS NULL
                            AND Difficulty.parent_difficulty_id IS NULL
                    ON CONFLICT DO NOTHING
                ",
            )
            .bind(name)
            .bind(description)
            .bind(difficulty_name)
            .execute(&mut *transaction)
            .await?;
        }
        transaction.commit().await?;
        Ok(())
    }
}
