#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tienda_model::{Address, Email, NewUser, PersonName};
use tienda_server::{
    build_router, hash_password, AppState, BootstrapAdmin, ServerConfig, CONFIG_SCHEMA_VERSION,
};
use tienda_store::{Store, StoreConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (Ok(mut sigterm), Ok(mut sigint)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("TIENDA_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn token_ttl(minutes: u64) -> Result<Duration, String> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("TIENDA_TOKEN_TTL_MINUTES={minutes} is out of range"))
}

fn jwt_secret() -> Vec<u8> {
    if let Some(secret) = env_nonempty("TIENDA_JWT_SECRET") {
        return secret.into_bytes();
    }
    warn!("TIENDA_JWT_SECRET not set; using a random per-process secret, tokens will not survive a restart");
    rand::random::<[u8; 32]>().to_vec()
}

fn bootstrap_admin() -> Option<BootstrapAdmin> {
    let email = env_nonempty("TIENDA_ADMIN_EMAIL")?;
    let Some(password) = env_nonempty("TIENDA_ADMIN_PASSWORD") else {
        warn!("TIENDA_ADMIN_EMAIL set without TIENDA_ADMIN_PASSWORD; skipping admin bootstrap");
        return None;
    };
    Some(BootstrapAdmin {
        email,
        password,
        full_name: env_nonempty("TIENDA_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
    })
}

async fn ensure_bootstrap_admin(
    store: &Store,
    admin: &BootstrapAdmin,
    iterations: u32,
) -> Result<(), String> {
    let new_user = NewUser {
        full_name: PersonName::parse(&admin.full_name)
            .map_err(|e| format!("invalid TIENDA_ADMIN_NAME: {e}"))?,
        email: Email::parse(&admin.email).map_err(|e| format!("invalid TIENDA_ADMIN_EMAIL: {e}"))?,
        password_hash: hash_password(&admin.password, iterations),
        address: Address::default(),
    };
    let store = store.clone();
    let user = tokio::task::spawn_blocking(move || store.ensure_admin(&new_user))
        .await
        .map_err(|e| format!("admin bootstrap task failed: {e}"))?
        .map_err(|e| format!("admin bootstrap failed: {e}"))?;
    info!(user_id = %user.id, "bootstrap admin ready");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();
    let defaults = ServerConfig::default();
    let ttl_minutes = env_u64("TIENDA_TOKEN_TTL_MINUTES", defaults.token_ttl.as_secs() / 60);
    let cfg = ServerConfig {
        bind_addr: env::var("TIENDA_BIND").unwrap_or(defaults.bind_addr),
        max_body_bytes: env_usize("TIENDA_MAX_BODY_BYTES", defaults.max_body_bytes),
        token_ttl: token_ttl(ttl_minutes)?,
        password_hash_iterations: u32::try_from(env_u64(
            "TIENDA_PASSWORD_HASH_ITERATIONS",
            u64::from(defaults.password_hash_iterations),
        ))
        .map_err(|_| "TIENDA_PASSWORD_HASH_ITERATIONS out of range".to_string())?,
        jwt_secret: jwt_secret(),
        bootstrap_admin: bootstrap_admin(),
    };
    cfg.validate()?;
    info!(
        config_schema_version = CONFIG_SCHEMA_VERSION,
        config = %serde_json::to_string(&cfg).unwrap_or_default(),
        "server configuration"
    );

    let store_cfg = StoreConfig {
        path: PathBuf::from(
            env::var("TIENDA_DB_PATH").unwrap_or_else(|_| "artifacts/tienda.sqlite".to_string()),
        ),
        busy_timeout: Duration::from_millis(env_u64("TIENDA_SQLITE_BUSY_TIMEOUT_MS", 5_000)),
    };
    let store = Store::open(store_cfg).map_err(|e| format!("store open failed: {e}"))?;
    if let Some(admin) = &cfg.bootstrap_admin {
        ensure_bootstrap_admin(&store, admin, cfg.password_hash_iterations).await?;
    }

    let bind_addr = cfg.bind_addr.clone();
    let app = build_router(AppState::new(store, cfg));
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("tienda-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))?;
    info!("tienda-server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_ttl_is_minutes_and_rejects_overflow() {
        assert_eq!(token_ttl(30), Ok(Duration::from_secs(1_800)));
        assert!(token_ttl(u64::MAX).is_err());
        assert!(token_ttl(u64::MAX / 60 + 1).is_err());
    }
}
