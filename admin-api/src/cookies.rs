use crate::config::AppConfig;

/// Refresh cookies are scoped to the auth routes so the browser never
/// attaches them to ordinary API calls.
pub const REFRESH_COOKIE_PATH: &str = "/auth";

pub fn refresh_cookie(config: &AppConfig, token: &str, max_age_seconds: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; HttpOnly; SameSite={}; Max-Age={}",
        config.refresh_cookie_name,
        token,
        REFRESH_COOKIE_PATH,
        config.refresh_cookie_same_site.as_str(),
        max_age_seconds
    );
    if let Some(domain) = &config.refresh_cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if config.refresh_cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_refresh_cookie(config: &AppConfig) -> String {
    refresh_cookie(config, "", 0)
}
