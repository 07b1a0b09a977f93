use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::require_scopes;
use crate::errors::ApiError;
use crate::models::drink::{Drink, Ingredient};
use crate::store::DrinkPatch;
use crate::AppState;

const SCOPE_GET_DETAIL: &str = "get:drinks-detail";
const SCOPE_POST: &str = "post:drinks";
const SCOPE_PATCH: &str = "patch:drinks";
const SCOPE_DELETE: &str = "delete:drinks";

/// Request body for POST and PATCH. Both fields optional at the schema
/// level; each handler enforces its own presence rules.
#[derive(Debug, Deserialize)]
struct DrinkPayload {
    title: Option<String>,
    recipe: Option<Vec<Ingredient>>,
}

/// Bodies are read raw and validated up front so every parse failure comes
/// back in the standard envelope, including a malformed recipe shape.
fn parse_payload(body: &Bytes) -> Result<DrinkPayload, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("rejected request payload: {}", e);
        ApiError::MalformedRequest("request body is not a valid drink payload".into())
    })
}

fn drinks_response(drinks: &[Drink], detail: bool) -> Json<Value> {
    let views: Vec<_> = drinks
        .iter()
        .map(|d| if detail { d.detailed() } else { d.summary() })
        .collect();
    Json(json!({ "success": true, "drinks": views }))
}

/// GET /drinks — public summary listing. An empty catalog is a 404, not an
/// empty list.
pub async fn list_drinks(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let drinks = state.store.list().await?;
    if drinks.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(drinks_response(&drinks, false))
}

/// GET /drinks-detail — full recipes, requires `get:drinks-detail`.
pub async fn list_drinks_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_scopes(&state.verifier, &headers, &[SCOPE_GET_DETAIL]).await?;

    let drinks = state.store.list().await?;
    if drinks.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(drinks_response(&drinks, true))
}

/// POST /drinks — create a drink, requires `post:drinks`. Responds with an
/// array containing only the new drink in detailed form.
pub async fn create_drink(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    require_scopes(&state.verifier, &headers, &[SCOPE_POST]).await?;

    let payload = parse_payload(&body)?;
    let (Some(title), Some(recipe)) = (payload.title, payload.recipe) else {
        return Err(ApiError::MalformedRequest(
            "both title and recipe are required".into(),
        ));
    };

    let drink = state.store.insert(&title, &recipe).await?;
    tracing::info!(id = drink.id, title = %drink.title, "drink created");
    Ok(drinks_response(&[drink], true))
}

/// PATCH /drinks/{id} — replace the supplied fields, requires
/// `patch:drinks`.
pub async fn update_drink(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    require_scopes(&state.verifier, &headers, &[SCOPE_PATCH]).await?;

    let id = parse_id(&id)?;
    let payload = parse_payload(&body)?;
    if payload.title.is_none() && payload.recipe.is_none() {
        return Err(ApiError::MalformedRequest(
            "at least one of title or recipe is required".into(),
        ));
    }

    let drink = state
        .store
        .update(
            id,
            DrinkPatch {
                title: payload.title,
                recipe: payload.recipe,
            },
        )
        .await?;
    tracing::info!(id = drink.id, "drink updated");
    Ok(drinks_response(&[drink], true))
}

/// DELETE /drinks/{id} — permanent delete, requires `delete:drinks`.
pub async fn delete_drink(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_scopes(&state.verifier, &headers, &[SCOPE_DELETE]).await?;

    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    tracing::info!(id, "drink deleted");
    Ok(Json(json!({ "success": true, "delete": id })))
}

/// A non-numeric id can't name any drink, so it reads as not-found rather
/// than a syntax error — same behavior the dynamic route matching of the
/// original service had.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}
