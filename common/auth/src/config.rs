use std::fmt;

/// Hard ceiling for clock-skew tolerance when validating exp.
pub const MAX_LEEWAY_SECONDS: u32 = 60;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 900;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Runtime configuration for token issuance and verification.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HS256 signing secret.
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_ttl_seconds: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_seconds: i64,
    /// Allowable clock skew in seconds when validating exp.
    pub leeway_seconds: u32,
}

impl JwtConfig {
    /// Construct config with sensible defaults (15 minute access tokens,
    /// 7 day refresh tokens, 30 second leeway).
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            leeway_seconds: 30,
        }
    }

    /// Adjust the access token lifetime.
    pub fn with_access_ttl(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    /// Adjust the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    /// Adjust the allowed leeway, clamped to [`MAX_LEEWAY_SECONDS`].
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds.min(MAX_LEEWAY_SECONDS);
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}
