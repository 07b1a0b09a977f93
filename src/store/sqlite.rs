//! SQLite-backed drink store.
//!
//! Title uniqueness is enforced by the UNIQUE constraint on `drinks.title`;
//! ids come from the rowid sequence and are never reused
//! (`AUTOINCREMENT`). Each operation is a single statement, so the engine's
//! per-statement atomicity covers the store contract.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use super::{DrinkPatch, DrinkStore, StoreError};
use crate::models::drink::{decode_recipe, encode_recipe, Drink, Ingredient};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_drink(row: &sqlx::sqlite::SqliteRow) -> Result<Drink, StoreError> {
        let id: i64 = row.get("id");
        let title: String = row.get("title");
        let raw: String = row.get("recipe");
        let recipe = decode_recipe(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Drink { id, title, recipe })
    }

    fn encode(recipe: &[Ingredient]) -> Result<String, StoreError> {
        encode_recipe(recipe).map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

#[async_trait]
impl DrinkStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        let rows = sqlx::query("SELECT id, title, recipe FROM drinks ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_drink).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        let row = sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_drink).transpose()
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Drink>, StoreError> {
        let row = sqlx::query("SELECT id, title, recipe FROM drinks WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_drink).transpose()
    }

    async fn insert(&self, title: &str, recipe: &[Ingredient]) -> Result<Drink, StoreError> {
        let raw = Self::encode(recipe)?;
        let result = sqlx::query("INSERT INTO drinks (title, recipe) VALUES (?, ?)")
            .bind(title)
            .bind(&raw)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Drink {
                id: done.last_insert_rowid(),
                title: title.to_string(),
                recipe: recipe.to_vec(),
            }),
            Err(e) => {
                if e.as_database_error()
                    .is_some_and(|d| d.is_unique_violation())
                {
                    Err(StoreError::TitleExists(title.to_string()))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn update(&self, id: i64, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let current = self.find_by_id(id).await?.ok_or(StoreError::NotFound)?;

        let title = patch.title.unwrap_or(current.title);
        let recipe = patch.recipe.unwrap_or(current.recipe);
        let raw = Self::encode(&recipe)?;

        let result = sqlx::query("UPDATE drinks SET title = ?, recipe = ? WHERE id = ?")
            .bind(&title)
            .bind(&raw)
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() > 0 => Ok(Drink { id, title, recipe }),
            Ok(_) => Err(StoreError::NotFound),
            Err(e) => {
                if e.as_database_error()
                    .is_some_and(|d| d.is_unique_violation())
                {
                    Err(StoreError::TitleExists(title))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM drinks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
