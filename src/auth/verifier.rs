//! Bearer JWT verification.
//!
//! Checks run in a fixed order and short-circuit on first failure: cheap
//! structural checks, then the signature, then the semantic claims (expiry,
//! issuer, audience). The error reported is the first check that failed.

use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;

use super::jwks::{KeyCache, VerifierKey};
use super::AuthError;

/// Expected token parameters. The signing-key source lives in [`KeyCache`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
}

/// The `aud` claim may be a single string or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(a) => a == expected,
            Audience::Many(list) => list.iter().any(|a| a == expected),
        }
    }
}

/// Verified token payload handed to handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub iss: Option<String>,
    pub aud: Option<Audience>,
    pub exp: i64,
    /// Auth0-style granted permissions list.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Standard space-delimited OAuth2 scope string.
    #[serde(default)]
    pub scope: Option<String>,
}

impl Claims {
    /// Granted scope set: union of `permissions` and the `scope` string.
    pub fn scopes(&self) -> HashSet<&str> {
        let mut set: HashSet<&str> = self.permissions.iter().map(String::as_str).collect();
        if let Some(scope) = &self.scope {
            set.extend(scope.split_whitespace());
        }
        set
    }
}

pub struct TokenVerifier {
    config: AuthConfig,
    keys: KeyCache,
}

impl TokenVerifier {
    pub fn new(config: AuthConfig, keys: KeyCache) -> Self {
        Self { config, keys }
    }

    /// Verify a bearer token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        // 1. Structure: three segments, decodable header and payload.
        let claims = decode_unverified_claims(token)?;
        let kid = decode_header(token)
            .map_err(|_| AuthError::MalformedToken)?
            .kid;

        // 2. Signature against the cached key set; on total failure refresh
        //    once and retry, so a rotated key doesn't lock clients out until
        //    the TTL lapses.
        let keys = self.keys.keys().await?;
        if !signature_valid(token, &keys, kid.as_deref()) {
            self.keys.refresh().await?;
            let keys = self.keys.keys().await?;
            if !signature_valid(token, &keys, kid.as_deref()) {
                return Err(AuthError::InvalidSignature);
            }
        }

        // 3. Expiry.
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        // 4. Issuer.
        if claims.iss.as_deref() != Some(self.config.issuer.as_str()) {
            return Err(AuthError::IssuerMismatch);
        }

        // 5. Audience.
        let aud_ok = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.config.audience));
        if !aud_ok {
            return Err(AuthError::AudienceMismatch);
        }

        Ok(claims)
    }
}

/// Decode the payload segment without verifying. Any shape problem here is
/// a malformed token, including a missing or non-numeric `exp`.
fn decode_unverified_claims(token: &str) -> Result<Claims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::MalformedToken);
    }
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)
}

/// Try every configured key, kid-matching keys first. The algorithm comes
/// from the key, never from the token header, so an attacker cannot select
/// a weaker scheme.
fn signature_valid(token: &str, keys: &[VerifierKey], kid: Option<&str>) -> bool {
    let matches_kid = |key: &&VerifierKey| match (kid, &key.kid) {
        (Some(t), Some(k)) => t == k,
        _ => false,
    };
    let preferred = keys.iter().filter(matches_kid);
    let rest = keys.iter().filter(|k| !matches_kid(k));

    for key in preferred.chain(rest) {
        let mut validation = Validation::new(key.alg);
        // Signature only here; expiry/issuer/audience are checked
        // separately so each failure reports its own error kind.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        if decode::<serde_json::Value>(token, &key.key, &validation).is_ok() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
    use serde_json::{json, Value};

    const SECRET: &[u8] = b"verifier-test-secret";
    const OTHER_SECRET: &[u8] = b"some-other-secret";

    fn static_verifier() -> TokenVerifier {
        let keys = KeyCache::from_static(vec![VerifierKey {
            kid: Some("test-key".into()),
            alg: Algorithm::HS256,
            key: DecodingKey::from_secret(SECRET),
        }]);
        TokenVerifier::new(
            AuthConfig {
                issuer: "https://issuer.test/".into(),
                audience: "drinks".into(),
            },
            keys,
        )
    }

    fn sign(claims: &Value, secret: &[u8]) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("test-key".into());
        encode(&header, claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn valid_claims() -> Value {
        json!({
            "sub": "user-1",
            "iss": "https://issuer.test/",
            "aud": "drinks",
            "exp": chrono::Utc::now().timestamp() + 600,
            "permissions": ["get:drinks-detail", "post:drinks"],
        })
    }

    #[tokio::test]
    async fn valid_token_yields_claims() {
        let verifier = static_verifier();
        let token = sign(&valid_claims(), SECRET);
        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert!(claims.scopes().contains("post:drinks"));
    }

    #[tokio::test]
    async fn scope_set_unions_permissions_and_scope_string() {
        let verifier = static_verifier();
        let mut claims = valid_claims();
        claims["scope"] = json!("delete:drinks patch:drinks");
        let token = sign(&claims, SECRET);
        let verified = verifier.verify(&token).await.unwrap();
        let scopes = verified.scopes();
        assert!(scopes.contains("post:drinks"));
        assert!(scopes.contains("delete:drinks"));
        assert!(scopes.contains("patch:drinks"));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let verifier = static_verifier();
        for token in ["", "not-a-jwt", "a.b", "a.b.c.d", "!!!.!!!.!!!"] {
            let err = verifier.verify(token).await.unwrap_err();
            assert!(matches!(err, AuthError::MalformedToken), "{token:?}: {err}");
        }
    }

    #[tokio::test]
    async fn missing_exp_is_malformed() {
        let verifier = static_verifier();
        let token = sign(&json!({"iss": "https://issuer.test/"}), SECRET);
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::MalformedToken
        ));
    }

    #[tokio::test]
    async fn wrong_key_is_invalid_signature() {
        let verifier = static_verifier();
        let token = sign(&valid_claims(), OTHER_SECRET);
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::InvalidSignature
        ));
    }

    #[tokio::test]
    async fn expired_token_reported_before_other_claim_problems() {
        let verifier = static_verifier();
        // Expired AND wrong issuer: expiry check comes first.
        let mut claims = valid_claims();
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 60);
        claims["iss"] = json!("https://elsewhere.test/");
        let token = sign(&claims, SECRET);
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::Expired
        ));
    }

    #[tokio::test]
    async fn issuer_mismatch() {
        let verifier = static_verifier();
        let mut claims = valid_claims();
        claims["iss"] = json!("https://elsewhere.test/");
        let token = sign(&claims, SECRET);
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::IssuerMismatch
        ));
    }

    #[tokio::test]
    async fn audience_mismatch_and_array_audience() {
        let verifier = static_verifier();

        let mut claims = valid_claims();
        claims["aud"] = json!("someone-else");
        let token = sign(&claims, SECRET);
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::AudienceMismatch
        ));

        let mut claims = valid_claims();
        claims["aud"] = json!(["someone-else", "drinks"]);
        let token = sign(&claims, SECRET);
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn rotation_tries_all_configured_keys() {
        let keys = KeyCache::from_static(vec![
            VerifierKey {
                kid: Some("old-key".into()),
                alg: Algorithm::HS256,
                key: DecodingKey::from_secret(OTHER_SECRET),
            },
            VerifierKey {
                kid: Some("test-key".into()),
                alg: Algorithm::HS256,
                key: DecodingKey::from_secret(SECRET),
            },
        ]);
        let verifier = TokenVerifier::new(
            AuthConfig {
                issuer: "https://issuer.test/".into(),
                audience: "drinks".into(),
            },
            keys,
        );
        let token = sign(&valid_claims(), SECRET);
        assert!(verifier.verify(&token).await.is_ok());
    }
}
