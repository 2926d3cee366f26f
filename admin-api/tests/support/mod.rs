use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use chrono::Utc;
use dirs::cache_dir;
use pg_embed::pg_enums::PgAuthMethod;
use pg_embed::pg_fetch::{PgFetchSettings, PG_V13};
use pg_embed::postgres::{PgEmbed, PgSettings};
use portpicker::pick_unused_port;
use rand_core::OsRng;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

use admin_api::config::{AppConfig, CookieSameSite};
use admin_api::metrics::AuthMetrics;
use admin_api::resolver::PermissionResolver;
use admin_api::store::{CredentialStore, MemoryCredentialStore, UserRecord};
use admin_api::AppState;
use common_auth::{JwtConfig, TokenService};

#[allow(dead_code)]
pub struct TestDatabase {
    pool: PgPool,
    embedded: Option<EmbeddedPg>,
}

#[allow(dead_code)]
impl TestDatabase {
    pub async fn setup() -> Result<Option<Self>> {
        if env::var("AUTH_TEST_DATABASE_URL").is_err() && !env_flag_enabled("AUTH_TEST_USE_EMBED") {
            eprintln!(
                "Skipping admin-api integration tests: set AUTH_TEST_DATABASE_URL or AUTH_TEST_USE_EMBED=1 to run them.",
            );
            return Ok(None);
        }

        let mut embedded = None;
        let database_url = if let Ok(url) = env::var("AUTH_TEST_DATABASE_URL") {
            url
        } else {
            if env_flag_enabled("AUTH_TEST_EMBED_CLEAR_CACHE") {
                if let Some(cache_dir) = cache_dir() {
                    let _ = std::fs::remove_dir_all(cache_dir.join("pg-embed"));
                }
            }

            let temp = tempdir()?;
            let port = pick_unused_port()
                .context("failed to find available port for embedded Postgres")?;

            let mut fetch_settings = PgFetchSettings::default();
            fetch_settings.version = PG_V13;

            let mut pg = PgEmbed::new(
                PgSettings {
                    database_dir: temp.path().to_path_buf(),
                    port,
                    user: "postgres".to_string(),
                    password: "postgres".to_string(),
                    auth_method: PgAuthMethod::Plain,
                    persistent: false,
                    timeout: Some(Duration::from_secs(30)),
                    migration_dir: None,
                },
                fetch_settings,
            )
            .await?;

            pg.setup().await?;
            pg.start_db().await?;

            let uri = format!("{}/postgres", pg.db_uri);
            embedded = Some(EmbeddedPg {
                pg,
                _temp_dir: temp,
            });
            uri
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        if embedded.is_some() || env_flag_enabled("AUTH_TEST_APPLY_MIGRATIONS") {
            run_migrations(&pool).await?;
        }

        Ok(Some(Self { pool, embedded }))
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub async fn teardown(self) -> Result<()> {
        if let Some(embedded) = self.embedded {
            embedded.shutdown().await;
        }
        Ok(())
    }
}

struct EmbeddedPg {
    pg: PgEmbed,
    _temp_dir: TempDir,
}

impl EmbeddedPg {
    async fn shutdown(mut self) {
        let _ = self.pg.stop_db().await;
    }
}

#[allow(dead_code)]
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let mut entries = std::fs::read_dir(&migrations_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    for path in entries {
        let sql = std::fs::read_to_string(&path)?;
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                continue;
            }
            sqlx::query(trimmed).execute(pool).await?;
        }
    }

    Ok(())
}

#[allow(dead_code)]
pub fn test_config(secret: &str) -> AppConfig {
    AppConfig {
        jwt: JwtConfig::new(secret.to_string()),
        refresh_cookie_name: "chatkit_refresh".to_string(),
        refresh_cookie_domain: None,
        refresh_cookie_secure: false,
        refresh_cookie_same_site: CookieSameSite::Strict,
        seed_on_startup: false,
        cors_allowed_origins: Vec::new(),
    }
}

#[allow(dead_code)]
pub fn build_state(store: Arc<dyn CredentialStore>, config: AppConfig) -> AppState {
    let config = Arc::new(config);
    let tokens = Arc::new(TokenService::new(config.jwt.clone()));
    let resolver = Arc::new(PermissionResolver::new(store.clone()));
    let metrics = Arc::new(AuthMetrics::new().expect("metrics registry"));
    AppState {
        store,
        tokens,
        resolver,
        config,
        metrics,
    }
}

#[allow(dead_code)]
pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("failed to hash test password")
        .to_string()
}

#[allow(dead_code)]
pub fn seed_memory_user(store: &MemoryCredentialStore, email: &str, password: &str) -> UserRecord {
    let now = Utc::now();
    let user = UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hash_password(password),
        full_name: "Test User".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.insert_user(user.clone());
    user
}

/// Creates the role and any missing permissions, grants them, and assigns the
/// role to the user.
#[allow(dead_code)]
pub async fn grant_role(
    store: &MemoryCredentialStore,
    user_id: Uuid,
    role_name: &str,
    permissions: &[&str],
) -> Result<()> {
    let role = match store.find_role_by_name(role_name).await? {
        Some(role) => role,
        None => store.create_role(role_name, "", false, false).await?,
    };
    for name in permissions {
        let permission = match store.find_permission_by_name(name).await? {
            Some(permission) => permission,
            None => {
                let (category, action) = name
                    .split_once(':')
                    .context("permission names are category:action")?;
                store.create_permission(name, "", category, action).await?
            }
        };
        store.create_role_permission(role.id, permission.id).await?;
    }
    store.assign_role(user_id, role.id);
    Ok(())
}

#[allow(dead_code)]
pub fn bearer_for(state: &AppState, user_id: Uuid, email: &str) -> String {
    let issued = state
        .tokens
        .create_access_token(user_id, email)
        .expect("issue access token");
    format!("Bearer {}", issued.token)
}

#[allow(dead_code)]
pub async fn seed_pg_user(pool: &PgPool, email: &str, password: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, full_name) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(email)
        .bind(hash_password(password))
        .bind("Integration User")
        .execute(pool)
        .await?;
    Ok(id)
}

#[allow(dead_code)]
pub async fn assign_pg_role(pool: &PgPool, user_id: Uuid, role_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .await?;
    Ok(())
}

fn env_flag_enabled(key: &str) -> bool {
    matches!(env::var(key), Ok(value) if is_truthy(value.as_str()))
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}
