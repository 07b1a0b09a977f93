//! Drink entity and its two public representations.
//!
//! The recipe is persisted as a JSON blob in a single column and decoded on
//! read. Decoding is strict: anything that is not an array of
//! `{color, name, parts}` objects is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One ingredient line of a recipe.
///
/// `deny_unknown_fields` keeps the wire schema closed — a payload carrying
/// extra or misspelled fields is a client error, not something to silently
/// drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ingredient {
    pub color: String,
    pub name: String,
    pub parts: u32,
}

/// A persistent drink record. Plain data — all persistence goes through the
/// store, never through the entity itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Summary ingredient — omits `name`.
#[derive(Debug, Serialize)]
struct IngredientSummary<'a> {
    color: &'a str,
    parts: u32,
}

/// Public representation of a drink, serialized into the response envelope.
#[derive(Debug, Serialize)]
pub struct DrinkView {
    pub id: i64,
    pub title: String,
    pub recipe: serde_json::Value,
}

impl Drink {
    /// Summary representation: `{id, title, recipe:[{color, parts}]}`.
    pub fn summary(&self) -> DrinkView {
        let recipe = self
            .recipe
            .iter()
            .map(|i| {
                serde_json::to_value(IngredientSummary {
                    color: &i.color,
                    parts: i.parts,
                })
                .unwrap_or_default()
            })
            .collect();
        DrinkView {
            id: self.id,
            title: self.title.clone(),
            recipe: serde_json::Value::Array(recipe),
        }
    }

    /// Detailed representation: `{id, title, recipe:[{color, name, parts}]}`.
    pub fn detailed(&self) -> DrinkView {
        DrinkView {
            id: self.id,
            title: self.title.clone(),
            recipe: serde_json::to_value(&self.recipe).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed recipe: {0}")]
pub struct RecipeError(String);

/// Encode a recipe into the blob stored in the `recipe` column.
pub fn encode_recipe(entries: &[Ingredient]) -> Result<String, RecipeError> {
    serde_json::to_string(entries).map_err(|e| RecipeError(e.to_string()))
}

/// Decode a stored recipe blob. Inverse of [`encode_recipe`]; lossless for
/// well-formed input.
pub fn decode_recipe(raw: &str) -> Result<Vec<Ingredient>, RecipeError> {
    serde_json::from_str(raw).map_err(|e| RecipeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latte() -> Drink {
        Drink {
            id: 1,
            title: "Latte".into(),
            recipe: vec![
                Ingredient {
                    color: "white".into(),
                    name: "milk".into(),
                    parts: 3,
                },
                Ingredient {
                    color: "brown".into(),
                    name: "espresso".into(),
                    parts: 1,
                },
            ],
        }
    }

    #[test]
    fn recipe_round_trips() {
        let recipe = latte().recipe;
        let encoded = encode_recipe(&recipe).unwrap();
        assert_eq!(decode_recipe(&encoded).unwrap(), recipe);
    }

    #[test]
    fn decode_rejects_non_array() {
        assert!(decode_recipe(r#"{"color":"white"}"#).is_err());
        assert!(decode_recipe("not json").is_err());
    }

    #[test]
    fn decode_rejects_missing_fields() {
        assert!(decode_recipe(r#"[{"color":"white","parts":3}]"#).is_err());
        assert!(decode_recipe(r#"[{"color":"white","name":"milk"}]"#).is_err());
    }

    #[test]
    fn decode_rejects_extra_fields() {
        let raw = r#"[{"color":"white","name":"milk","parts":3,"note":"hot"}]"#;
        assert!(decode_recipe(raw).is_err());
    }

    #[test]
    fn decode_rejects_wrong_types() {
        assert!(decode_recipe(r#"[{"color":"white","name":"milk","parts":"3"}]"#).is_err());
        assert!(decode_recipe(r#"[{"color":7,"name":"milk","parts":3}]"#).is_err());
    }

    #[test]
    fn summary_omits_ingredient_name() {
        let view = latte().summary();
        let json = serde_json::to_value(&view).unwrap();
        for entry in json["recipe"].as_array().unwrap() {
            assert!(entry.get("name").is_none());
            assert!(entry.get("color").is_some());
            assert!(entry.get("parts").is_some());
        }
    }

    #[test]
    fn detailed_includes_ingredient_name() {
        let view = latte().detailed();
        let json = serde_json::to_value(&view).unwrap();
        for entry in json["recipe"].as_array().unwrap() {
            assert!(entry.get("name").is_some());
        }
        assert_eq!(json["recipe"][0]["name"], "milk");
    }
}
