mod support;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{
    header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    Request, StatusCode,
};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use admin_api::router;
use admin_api::store::MemoryCredentialStore;

use support::{build_state, grant_role, seed_memory_user, test_config};

async fn post_login(app: &Router, email: &str, password: &str) -> Result<axum::response::Response> {
    let body = json!({ "email": email, "password": password }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))?;
    Ok(app.clone().oneshot(request).await?)
}

async fn post_refresh(app: &Router, cookie: Option<&str>) -> Result<axum::response::Response> {
    let mut builder = Request::builder().method("POST").uri("/auth/refresh");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    Ok(app.clone().oneshot(builder.body(Body::empty())?).await?)
}

fn cookie_pair(response: &axum::response::Response) -> Result<String> {
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .ok_or_else(|| anyhow!("missing refresh cookie"))?
        .to_str()?;
    Ok(set_cookie
        .split(';')
        .next()
        .ok_or_else(|| anyhow!("invalid cookie format"))?
        .trim()
        .to_string())
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn login_sets_the_refresh_cookie() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let user = seed_memory_user(&store, "ada@example.com", "CorrectHorseBatteryStaple!");
    grant_role(&store, user.id, "editor", &["widget:update", "widget:read"]).await?;
    let state = build_state(store, test_config("session-secret"));
    let app = router(state.clone());

    let response = post_login(&app, "ada@example.com", "CorrectHorseBatteryStaple!").await?;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .ok_or_else(|| anyhow!("missing refresh cookie"))?
        .to_str()?
        .to_string();
    assert!(set_cookie.starts_with("chatkit_refresh="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/auth"));
    assert!(set_cookie.contains("Max-Age=604800"));

    let body = body_json(response).await?;
    assert_eq!(body["token_type"], json!("Bearer"));
    assert_eq!(body["expires_in"], json!(900));
    assert_eq!(body["user"]["email"], json!("ada@example.com"));
    assert_eq!(body["user"]["roles"], json!(["editor"]));
    assert_eq!(
        body["user"]["permissions"],
        json!(["widget:update", "widget:read"])
    );

    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| anyhow!("missing access token"))?;
    let claims = state.tokens.verify_access(access_token)?;
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.email, "ada@example.com");
    Ok(())
}

#[tokio::test]
async fn login_failures_are_uniform() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let user = seed_memory_user(&store, "ada@example.com", "CorrectHorseBatteryStaple!");
    let state = build_state(store.clone(), test_config("session-secret"));
    let app = router(state);

    // The body is identical for every failure variant and no cookie is set.
    let response = post_login(&app, "ada@example.com", "wrong-password").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = body_json(response).await?;
    assert_eq!(body["code"], json!("INVALID_CREDENTIALS"));
    assert_eq!(body["message"], json!("Invalid credentials. Please try again."));

    let response = post_login(&app, "nobody@example.com", "CorrectHorseBatteryStaple!").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = body_json(response).await?;
    assert_eq!(body["code"], json!("INVALID_CREDENTIALS"));

    store.set_user_active(user.id, false);
    let response = post_login(&app, "ada@example.com", "CorrectHorseBatteryStaple!").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = body_json(response).await?;
    assert_eq!(body["code"], json!("INVALID_CREDENTIALS"));
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_the_pair() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let user = seed_memory_user(&store, "ada@example.com", "CorrectHorseBatteryStaple!");
    grant_role(&store, user.id, "viewer", &["widget:read"]).await?;
    let state = build_state(store, test_config("session-secret"));
    let app = router(state.clone());

    let login_response = post_login(&app, "ada@example.com", "CorrectHorseBatteryStaple!").await?;
    assert_eq!(login_response.status(), StatusCode::OK);
    let cookie = cookie_pair(&login_response)?;

    let response = post_refresh(&app, Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let rotated = cookie_pair(&response)?;
    let (_, refresh_token) = rotated
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid cookie pair"))?;
    let refresh_claims = state.tokens.verify_refresh(refresh_token)?;
    assert_eq!(refresh_claims.sub, user.id);

    let body = body_json(response).await?;
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| anyhow!("missing access token"))?;
    let claims = state.tokens.verify_access(access_token)?;
    assert_eq!(claims.sub, user.id);
    assert_eq!(body["user"]["roles"], json!(["viewer"]));
    Ok(())
}

#[tokio::test]
async fn refresh_without_a_cookie_is_denied() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = build_state(store, test_config("session-secret"));
    let app = router(state);

    let response = post_refresh(&app, None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let clearing = cookie_pair(&response)?;
    assert_eq!(clearing, "chatkit_refresh=");
    let body = body_json(response).await?;
    assert_eq!(body["code"], json!("UNAUTHORIZED"));
    assert_eq!(body["message"], json!("Authentication required"));
    Ok(())
}

#[tokio::test]
async fn refresh_with_a_garbage_cookie_is_denied() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = build_state(store, test_config("session-secret"));
    let app = router(state);

    let response = post_refresh(&app, Some("chatkit_refresh=not.a.jwt")).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .ok_or_else(|| anyhow!("missing clearing cookie"))?
        .to_str()?;
    assert!(set_cookie.contains("Max-Age=0"));
    Ok(())
}

// A valid token for an account that no longer exists gets the same response
// as a bad token; the endpoint never confirms whether the account was real.
#[tokio::test]
async fn refresh_for_a_vanished_user_is_denied() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let user = seed_memory_user(&store, "ada@example.com", "CorrectHorseBatteryStaple!");
    let state = build_state(store.clone(), test_config("session-secret"));
    let app = router(state);

    let login_response = post_login(&app, "ada@example.com", "CorrectHorseBatteryStaple!").await?;
    let cookie = cookie_pair(&login_response)?;

    store.remove_user(user.id);
    let response = post_refresh(&app, Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .ok_or_else(|| anyhow!("missing clearing cookie"))?
        .to_str()?;
    assert!(set_cookie.contains("Max-Age=0"));
    let body = body_json(response).await?;
    assert_eq!(body["code"], json!("UNAUTHORIZED"));
    Ok(())
}

#[tokio::test]
async fn refresh_for_a_deactivated_user_is_denied() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let user = seed_memory_user(&store, "ada@example.com", "CorrectHorseBatteryStaple!");
    let state = build_state(store.clone(), test_config("session-secret"));
    let app = router(state);

    let login_response = post_login(&app, "ada@example.com", "CorrectHorseBatteryStaple!").await?;
    let cookie = cookie_pair(&login_response)?;

    store.set_user_active(user.id, false);
    let response = post_refresh(&app, Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_cookie() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = build_state(store, test_config("session-secret"));
    let app = router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .ok_or_else(|| anyhow!("missing clearing cookie"))?
        .to_str()?;
    assert!(set_cookie.starts_with("chatkit_refresh=;"));
    assert!(set_cookie.contains("Max-Age=0"));
    Ok(())
}

// Logout only instructs the browser to drop the cookie. Nothing server side
// marks the pair dead, so a client that kept the value can still rotate it.
#[tokio::test]
async fn refresh_after_logout_still_succeeds() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    seed_memory_user(&store, "ada@example.com", "CorrectHorseBatteryStaple!");
    let state = build_state(store, test_config("session-secret"));
    let app = router(state);

    let login_response = post_login(&app, "ada@example.com", "CorrectHorseBatteryStaple!").await?;
    let cookie = cookie_pair(&login_response)?;

    let logout = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(COOKIE, &cookie)
        .body(Body::empty())?;
    let logout_response = app.clone().oneshot(logout).await?;
    assert_eq!(logout_response.status(), StatusCode::NO_CONTENT);

    let response = post_refresh(&app, Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn metrics_track_login_outcomes() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::new());
    seed_memory_user(&store, "ada@example.com", "CorrectHorseBatteryStaple!");
    let state = build_state(store, test_config("session-secret"));
    let app = router(state);

    let response = post_login(&app, "ada@example.com", "CorrectHorseBatteryStaple!").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let response = post_login(&app, "ada@example.com", "wrong-password").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let metrics_response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty())?)
        .await?;
    assert_eq!(metrics_response.status(), StatusCode::OK);
    let bytes = metrics_response.into_body().collect().await?.to_bytes();
    let text = std::str::from_utf8(&bytes)?;
    assert!(text.contains("auth_login_attempts_total"));
    assert!(text.contains("outcome=\"success\""));
    assert!(text.contains("outcome=\"denied\""));
    Ok(())
}
