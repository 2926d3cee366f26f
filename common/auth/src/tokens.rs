use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::claims::{AccessClaims, RefreshClaims};
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// A signed token together with its expiry as a unix timestamp.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Issues and verifies HS256 tokens over the process-wide signing secret.
///
/// There is no server-side invalidation: a signed token stays usable until
/// its natural expiry. Logout only clears the refresh cookie.
pub struct TokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds.into();
        // Tokens carry no audience claim.
        validation.validate_aud = false;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Sign a short-lived access token for the given subject.
    pub fn create_access_token(&self, user_id: Uuid, email: &str) -> AuthResult<IssuedToken> {
        let claims = AccessClaims::new(user_id, email, self.config.access_ttl_seconds);
        let token = self.sign(&claims)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Sign a refresh token carrying only the subject id.
    pub fn create_refresh_token(&self, user_id: Uuid) -> AuthResult<IssuedToken> {
        let claims = RefreshClaims::new(user_id, self.config.refresh_ttl_seconds);
        let token = self.sign(&claims)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Validate signature and expiry, then deserialize the payload.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> AuthResult<T> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    pub fn verify_access(&self, token: &str) -> AuthResult<AccessClaims> {
        self.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        self.verify(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|err| AuthError::Internal(format!("failed to sign token: {err}")))
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    let message = match err.kind() {
        ErrorKind::ExpiredSignature => "Token has expired",
        ErrorKind::InvalidSignature => "Invalid token signature",
        ErrorKind::ImmatureSignature => "Token not yet valid",
        _ => "Invalid token",
    };
    AuthError::InvalidToken(message.to_string())
}
