//! Drink persistence.
//!
//! Handlers depend on the [`DrinkStore`] trait, not on a concrete engine.
//! Production uses [`sqlite::SqliteStore`]; tests inject
//! [`memory::MemoryStore`].

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::drink::{Drink, Ingredient};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("drink not found")]
    NotFound,

    #[error("a drink titled '{0}' already exists")]
    TitleExists(String),

    /// A stored recipe blob no longer decodes. This is a data integrity
    /// problem, not a client error.
    #[error("stored recipe is corrupt: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields to change on update. `None` keeps the prior value.
#[derive(Debug, Default)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

/// Create/read/update/delete contract over the drink catalog.
///
/// Every mutation commits durably before returning; the backing engine
/// provides per-call atomicity, so no partial write is ever observable.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// All drinks, in id order. Empty vec when the catalog is empty.
    async fn list(&self) -> Result<Vec<Drink>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, StoreError>;

    async fn find_by_title(&self, title: &str) -> Result<Option<Drink>, StoreError>;

    /// Insert a new drink; the store assigns the id. Fails with
    /// [`StoreError::TitleExists`] when the title is taken.
    async fn insert(&self, title: &str, recipe: &[Ingredient]) -> Result<Drink, StoreError>;

    /// Replace only the supplied fields of an existing drink.
    async fn update(&self, id: i64, patch: DrinkPatch) -> Result<Drink, StoreError>;

    /// Permanent delete, no tombstone.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
