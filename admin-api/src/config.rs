use anyhow::{anyhow, Context, Result};
use std::env;

use common_auth::JwtConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieSameSite {
    Lax,
    Strict,
    None,
}

impl CookieSameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookieSameSite::Lax => "Lax",
            CookieSameSite::Strict => "Strict",
            CookieSameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub refresh_cookie_name: String,
    pub refresh_cookie_domain: Option<String>,
    pub refresh_cookie_secure: bool,
    pub refresh_cookie_same_site: CookieSameSite,
    pub seed_on_startup: bool,
    pub cors_allowed_origins: Vec<String>,
}

pub fn load_app_config() -> Result<AppConfig> {
    let secret = env::var("AUTH_TOKEN_SECRET").context("AUTH_TOKEN_SECRET must be set")?;
    let secret = secret.trim().to_string();
    if secret.is_empty() {
        return Err(anyhow!("AUTH_TOKEN_SECRET must not be empty"));
    }

    let mut jwt = JwtConfig::new(secret);
    if let Some(ttl) = i64_from_env("AUTH_ACCESS_TTL_SECONDS")? {
        jwt = jwt.with_access_ttl(ttl);
    }
    if let Some(ttl) = i64_from_env("AUTH_REFRESH_TTL_SECONDS")? {
        jwt = jwt.with_refresh_ttl(ttl);
    }
    if let Some(leeway) = u32_from_env("AUTH_TOKEN_LEEWAY_SECONDS")? {
        jwt = jwt.with_leeway(leeway);
    }

    let refresh_cookie_name =
        env::var("AUTH_REFRESH_COOKIE_NAME").unwrap_or_else(|_| "chatkit_refresh".to_string());
    let refresh_cookie_domain = env::var("AUTH_REFRESH_COOKIE_DOMAIN")
        .ok()
        .and_then(|value| normalize_optional(&value));
    let refresh_cookie_secure = bool_from_env("AUTH_REFRESH_COOKIE_SECURE").unwrap_or(false);
    let refresh_cookie_same_site = env::var("AUTH_REFRESH_COOKIE_SAMESITE")
        .ok()
        .map(|value| parse_same_site(&value))
        .transpose()
        .context("Failed to parse AUTH_REFRESH_COOKIE_SAMESITE")?
        .unwrap_or(CookieSameSite::Strict);

    let seed_on_startup = bool_from_env("AUTH_SEED_ON_STARTUP").unwrap_or(true);

    let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|value| parse_origins(&value))
        .unwrap_or_else(default_origins);

    Ok(AppConfig {
        jwt,
        refresh_cookie_name,
        refresh_cookie_domain,
        refresh_cookie_secure,
        refresh_cookie_same_site,
        seed_on_startup,
        cors_allowed_origins,
    })
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn i64_from_env(key: &str) -> Result<Option<i64>> {
    match env::var(key) {
        Ok(value) => {
            let parsed = value
                .trim()
                .parse::<i64>()
                .map_err(|err| anyhow!("Invalid value for {key}: {err}"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

fn u32_from_env(key: &str) -> Result<Option<u32>> {
    match env::var(key) {
        Ok(value) => {
            let parsed = value
                .trim()
                .parse::<u32>()
                .map_err(|err| anyhow!("Invalid value for {key}: {err}"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(|item| {
            let origin = item.trim();
            if origin.is_empty() {
                None
            } else {
                Some(origin.to_string())
            }
        })
        .collect()
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_same_site(value: &str) -> Result<CookieSameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(CookieSameSite::Lax),
        "strict" => Ok(CookieSameSite::Strict),
        "none" => Ok(CookieSameSite::None),
        other => Err(anyhow!(
            "Unsupported cookie same-site policy '{other}'. Use Lax, Strict, or None."
        )),
    }
}
