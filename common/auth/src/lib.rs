pub mod access;
pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod roles;
pub mod tokens;

pub use access::{AccessResolver, ResolvedAccess};
pub use claims::{AccessClaims, RefreshClaims};
pub use config::JwtConfig;
pub use error::{AuthError, AuthResult};
pub use extractors::AuthContext;
pub use guards::{ensure_admin, ensure_any_permission, ensure_permission, ensure_role};
pub use roles::{ROLE_ADMIN, ROLE_EDITOR, ROLE_USER, ROLE_VIEWER};
pub use tokens::{IssuedToken, TokenService};
