use serde::Deserialize;

/// Upper bound on token lifetime: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub token: TokenConfig,
}

impl TokenConfig {
    pub fn ttl(&self) -> time::Duration {
        time::Duration::hours(self.ttl_hours)
    }
}

/// Unparseable or non-positive values fall back to the default; larger
/// ones are clamped to `MAX_TOKEN_TTL_HOURS`.
fn parse_ttl_hours(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|h| *h > 0)
        .map(|h| h.min(MAX_TOKEN_TTL_HOURS))
        .unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let token = TokenConfig {
            ttl_hours: parse_ttl_hours(std::env::var("TOKEN_TTL_HOURS").ok().as_deref()),
        };
        Ok(Self {
            database_url,
            max_connections,
            token,
        })
    }
}
