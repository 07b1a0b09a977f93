//! Bearer-token verification and scope enforcement.
//!
//! The issuer signs tokens and publishes its keys; this module only
//! verifies. `jwks` owns key material, `verifier` runs the check sequence,
//! `guard` is what handlers call.

pub mod guard;
pub mod jwks;
pub mod verifier;

pub use guard::require_scopes;
pub use verifier::{AuthConfig, Claims, TokenVerifier};

use thiserror::Error;

/// Everything that can go wrong between an `Authorization` header and a
/// verified claim set.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing or not a bearer token")]
    MissingToken,

    #[error("token is malformed")]
    MalformedToken,

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token issuer mismatch")]
    IssuerMismatch,

    #[error("token audience mismatch")]
    AudienceMismatch,

    #[error("insufficient scope: missing {}", missing.join(", "))]
    InsufficientScope { missing: Vec<String> },

    /// Key material could not be fetched. Reported as unauthorized at the
    /// boundary, never with transport detail.
    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
}
