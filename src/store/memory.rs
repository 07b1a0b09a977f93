//! In-memory drink store.
//!
//! Same contract as the SQLite store, held in a `RwLock`'d map. Used as the
//! injected fake in handler and integration tests, and handy for local
//! experiments without a database file.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DrinkPatch, DrinkStore, StoreError};
use crate::models::drink::{Drink, Ingredient};

pub struct MemoryStore {
    drinks: RwLock<BTreeMap<i64, Drink>>,
    // Monotonic, so ids are never reused even after deletes.
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            drinks: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DrinkStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        Ok(self.drinks.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        Ok(self.drinks.read().await.get(&id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Drink>, StoreError> {
        Ok(self
            .drinks
            .read()
            .await
            .values()
            .find(|d| d.title == title)
            .cloned())
    }

    async fn insert(&self, title: &str, recipe: &[Ingredient]) -> Result<Drink, StoreError> {
        let mut drinks = self.drinks.write().await;
        if drinks.values().any(|d| d.title == title) {
            return Err(StoreError::TitleExists(title.to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let drink = Drink {
            id,
            title: title.to_string(),
            recipe: recipe.to_vec(),
        };
        drinks.insert(id, drink.clone());
        Ok(drink)
    }

    async fn update(&self, id: i64, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let mut drinks = self.drinks.write().await;

        if let Some(new_title) = &patch.title {
            if drinks.values().any(|d| d.id != id && &d.title == new_title) {
                return Err(StoreError::TitleExists(new_title.clone()));
            }
        }

        let drink = drinks.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(title) = patch.title {
            drink.title = title;
        }
        if let Some(recipe) = patch.recipe {
            drink.recipe = recipe;
        }
        Ok(drink.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.drinks
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milk() -> Vec<Ingredient> {
        vec![Ingredient {
            color: "white".into(),
            name: "milk".into(),
            parts: 3,
        }]
    }

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert("Latte", &milk()).await.unwrap();
        let b = store.insert("Mocha", &milk()).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn duplicate_title_rejected_and_size_unchanged() {
        let store = MemoryStore::new();
        store.insert("Latte", &milk()).await.unwrap();
        assert!(matches!(
            store.insert("Latte", &milk()).await.unwrap_err(),
            StoreError::TitleExists(_)
        ));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_stolen_title() {
        let store = MemoryStore::new();
        store.insert("Latte", &milk()).await.unwrap();
        let mocha = store.insert("Mocha", &milk()).await.unwrap();

        let err = store
            .update(
                mocha.id,
                DrinkPatch {
                    title: Some("Latte".into()),
                    recipe: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TitleExists(_)));
    }

    #[tokio::test]
    async fn delete_then_insert_does_not_reuse_id() {
        let store = MemoryStore::new();
        let a = store.insert("Latte", &milk()).await.unwrap();
        store.delete(a.id).await.unwrap();
        let b = store.insert("Mocha", &milk()).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
