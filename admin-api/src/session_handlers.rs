use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use common_auth::{AuthContext, AuthError};

use crate::cookies::{clear_refresh_cookie, refresh_cookie};
use crate::error::{ApiError, ApiResult};
use crate::store::UserRecord;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserSummary,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let LoginRequest { email, password } = request;

    // Every failure mode here collapses into the same response so the
    // endpoint cannot be used to probe for registered emails.
    let user = match state.store.find_user_by_email(&email).await? {
        Some(user) if user.is_active => user,
        _ => {
            state.metrics.login_attempt("denied");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !password_matches(&user, &password) {
        state.metrics.login_attempt("denied");
        return Err(ApiError::InvalidCredentials);
    }

    let response = match issue_session(&state, &user).await {
        Ok(response) => response,
        Err(err) => {
            state.metrics.login_attempt("error");
            return Err(err);
        }
    };

    state.metrics.login_attempt("success");
    Ok(response)
}

/// Rotates the refresh pair. The previous refresh token is not tracked server
/// side, so rotation replaces the cookie rather than invalidating the old
/// value.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = match refresh_token_from_headers(&headers, &state.config.refresh_cookie_name) {
        Some(token) => token,
        None => return denied(&state),
    };

    let claims = match state.tokens.verify_refresh(&token) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "refresh token rejected");
            return denied(&state);
        }
    };

    let user = match state.store.find_user_by_id(claims.sub).await {
        Ok(Some(user)) if user.is_active => user,
        // A valid token for a vanished or deactivated account gets the same
        // cleared-cookie 401 as a bad token.
        Ok(_) => return denied(&state),
        // A store outage is not a verdict on the session; the cookie stays.
        Err(err) => {
            state.metrics.refresh_attempt("error");
            return ApiError::Store(err).into_response();
        }
    };

    let response = match issue_session(&state, &user).await {
        Ok(response) => response,
        Err(err) => {
            state.metrics.refresh_attempt("error");
            return err.into_response();
        }
    };

    state.metrics.refresh_attempt("success");
    response
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let clear = clear_refresh_cookie(&state.config);
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, clear)])
}

pub async fn me(auth: AuthContext) -> Json<AuthContext> {
    Json(auth)
}

async fn issue_session(state: &AppState, user: &UserRecord) -> ApiResult<Response> {
    let access = state.resolver.roles_and_permissions(user.id).await?;
    let issued_access = state.tokens.create_access_token(user.id, &user.email)?;
    let issued_refresh = state.tokens.create_refresh_token(user.id)?;

    let cookie = refresh_cookie(
        &state.config,
        &issued_refresh.token,
        state.config.jwt.refresh_ttl_seconds,
    );
    let body = SessionResponse {
        access_token: issued_access.token,
        token_type: "Bearer",
        expires_in: state.config.jwt.access_ttl_seconds,
        user: UserSummary {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            roles: access.roles,
            permissions: access.permissions,
        },
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

fn denied(state: &AppState) -> Response {
    state.metrics.refresh_attempt("denied");
    let clear = clear_refresh_cookie(&state.config);
    (
        [(header::SET_COOKIE, clear)],
        AuthError::Unauthorized("Authentication required"),
    )
        .into_response()
}

fn password_matches(user: &UserRecord, password: &str) -> bool {
    match PasswordHash::new(&user.password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(user_id = %user.id, error = %err, "stored password hash is unreadable");
            false
        }
    }
}

fn refresh_token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, token) = pair.trim().split_once('=')?;
            if name == cookie_name && !token.is_empty() {
                Some(token.to_string())
            } else {
                None
            }
        })
        .next()
}
