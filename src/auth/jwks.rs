//! Signing-key material, fetched from the issuer's JWKS endpoint.
//!
//! Keys are process-wide read-mostly state: fetched once, cached with a
//! bounded TTL, and re-fetched when the TTL lapses or when the verifier
//! sees a signature failure (key rotation tolerance). Never fetched per
//! request.

use std::str::FromStr;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::AuthError;

/// JSON Web Key Set document.
#[derive(Debug, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// A single JSON Web Key. Only the members we consume are modeled.
#[derive(Debug, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: Option<String>,
    pub alg: Option<String>,
    // RSA public key components
    pub n: Option<String>,
    pub e: Option<String>,
    // Symmetric key material
    pub k: Option<String>,
}

/// A key ready for signature verification.
#[derive(Clone)]
pub struct VerifierKey {
    pub kid: Option<String>,
    pub alg: Algorithm,
    pub key: DecodingKey,
}

impl Jwk {
    /// Convert to a decoding key, or `None` for key types we don't support
    /// (those are skipped, not fatal — a JWKS may carry encryption keys too).
    fn to_verifier_key(&self) -> Option<VerifierKey> {
        let (key, default_alg) = match self.kty.as_str() {
            "RSA" => {
                let n = self.n.as_deref()?;
                let e = self.e.as_deref()?;
                (DecodingKey::from_rsa_components(n, e).ok()?, Algorithm::RS256)
            }
            "oct" => {
                let secret = URL_SAFE_NO_PAD.decode(self.k.as_deref()?).ok()?;
                (DecodingKey::from_secret(&secret), Algorithm::HS256)
            }
            _ => return None,
        };
        let alg = self
            .alg
            .as_deref()
            .and_then(|a| Algorithm::from_str(a).ok())
            .unwrap_or(default_alg);
        Some(VerifierKey {
            kid: self.kid.clone(),
            alg,
            key,
        })
    }
}

struct CachedKeys {
    keys: Vec<VerifierKey>,
    fetched_at: Option<Instant>,
}

enum KeySource {
    Remote {
        http: reqwest::Client,
        jwks_url: String,
        ttl: Duration,
    },
    /// Fixed key set, never refreshed. For tests and offline setups.
    Static,
}

/// Process-wide cache of the issuer's verification keys.
pub struct KeyCache {
    source: KeySource,
    inner: RwLock<CachedKeys>,
}

impl KeyCache {
    pub fn new(jwks_url: String, ttl: Duration) -> Self {
        Self {
            source: KeySource::Remote {
                http: reqwest::Client::new(),
                jwks_url,
                ttl,
            },
            inner: RwLock::new(CachedKeys {
                keys: Vec::new(),
                fetched_at: None,
            }),
        }
    }

    pub fn from_static(keys: Vec<VerifierKey>) -> Self {
        Self {
            source: KeySource::Static,
            inner: RwLock::new(CachedKeys {
                keys,
                fetched_at: Some(Instant::now()),
            }),
        }
    }

    /// Current key set, fetching first if the cache is empty or stale.
    pub async fn keys(&self) -> Result<Vec<VerifierKey>, AuthError> {
        if let KeySource::Remote { ttl, .. } = &self.source {
            let stale = {
                let cached = self.inner.read().await;
                match cached.fetched_at {
                    Some(at) => at.elapsed() >= *ttl,
                    None => true,
                }
            };
            if stale {
                self.refresh().await?;
            }
        }
        Ok(self.inner.read().await.keys.clone())
    }

    /// Force a re-fetch. Called on TTL expiry and on signature-check
    /// failure; a no-op for static key sets.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let KeySource::Remote { http, jwks_url, .. } = &self.source else {
            return Ok(());
        };

        tracing::info!(jwks_url = %jwks_url, "fetching JWKS");
        let jwks: Jwks = http
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;

        let keys: Vec<VerifierKey> = jwks.keys.iter().filter_map(Jwk::to_verifier_key).collect();
        if keys.is_empty() {
            return Err(AuthError::KeysUnavailable(
                "JWKS contained no usable keys".into(),
            ));
        }

        let mut cached = self.inner.write().await;
        cached.keys = keys;
        cached.fetched_at = Some(Instant::now());
        Ok(())
    }
}
