use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Expected `iss` claim, e.g. `https://example.auth0.com/`.
    pub auth_issuer: String,
    /// Expected `aud` claim.
    pub auth_audience: String,
    /// Where the issuer publishes its signing keys. Defaults to the
    /// conventional `<issuer>/.well-known/jwks.json`.
    pub jwks_url: String,
    /// How long fetched signing keys stay fresh, in seconds.
    pub jwks_ttl_secs: u64,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let auth_issuer = std::env::var("TAPLINE_AUTH_ISSUER")
        .map_err(|_| anyhow::anyhow!("TAPLINE_AUTH_ISSUER must be set to the token issuer URL"))?;
    let auth_audience = std::env::var("TAPLINE_AUTH_AUDIENCE")
        .map_err(|_| anyhow::anyhow!("TAPLINE_AUTH_AUDIENCE must be set to the expected audience"))?;

    let jwks_url = std::env::var("TAPLINE_JWKS_URL").unwrap_or_else(|_| {
        format!(
            "{}/.well-known/jwks.json",
            auth_issuer.trim_end_matches('/')
        )
    });

    Ok(Config {
        port: std::env::var("TAPLINE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tapline.db?mode=rwc".into()),
        auth_issuer,
        auth_audience,
        jwks_url,
        jwks_ttl_secs: std::env::var("TAPLINE_JWKS_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600),
    })
}
