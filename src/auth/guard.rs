//! Per-endpoint scope enforcement.
//!
//! Handlers call [`require_scopes`] before touching the store; a protected
//! handler body only runs with a verified claim set in hand.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use super::verifier::{Claims, TokenVerifier};
use super::AuthError;

/// Pull the bearer token out of the `Authorization` header. The scheme is
/// matched case-insensitively per RFC 7235.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Verify the request's token and require every scope in `required`.
///
/// Verification failures propagate unchanged; a verified token lacking any
/// required scope fails with [`AuthError::InsufficientScope`] naming the
/// missing scopes. On success the claim set is returned for the handler's
/// use.
pub async fn require_scopes(
    verifier: &TokenVerifier,
    headers: &HeaderMap,
    required: &[&str],
) -> Result<Claims, AuthError> {
    let token = bearer_token(headers)?;
    let claims = verifier.verify(token).await?;

    let granted = claims.scopes();
    let mut missing: Vec<String> = required
        .iter()
        .filter(|s| !granted.contains(**s))
        .map(|s| s.to_string())
        .collect();

    if !missing.is_empty() {
        missing.sort();
        return Err(AuthError::InsufficientScope { missing });
    }

    tracing::debug!(
        sub = claims.sub.as_deref().unwrap_or("<none>"),
        scopes = ?required,
        "request authorized"
    );
    Ok(claims)
}
