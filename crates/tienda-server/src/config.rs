use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

/// Account created (or promoted) to administrator at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_body_bytes: usize,
    pub token_ttl: Duration,
    pub password_hash_iterations: u32,
    #[serde(skip_serializing)]
    pub jwt_secret: Vec<u8>,
    #[serde(skip_serializing)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            max_body_bytes: 64 * 1024,
            token_ttl: Duration::from_secs(30 * 60),
            password_hash_iterations: 100_000,
            jwt_secret: Vec::new(),
            bootstrap_admin: None,
        }
    }
}

impl ServerConfig {
    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 16 {
            return Err("jwt secret must be at least 16 bytes".to_string());
        }
        if self.password_hash_iterations == 0 {
            return Err("password hash iterations must be positive".to_string());
        }
        if self.token_ttl.is_zero() {
            return Err("token ttl must be positive".to_string());
        }
        if self.max_body_bytes == 0 {
            return Err("max body bytes must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_never_serialized() {
        let cfg = ServerConfig {
            jwt_secret: b"super-secret-signing-key".to_vec(),
            ..ServerConfig::default()
        };
        let json = serde_json::to_string(&cfg).expect("json");
        assert!(!json.contains("jwt_secret"));
        assert!(json.contains("bind_addr"));
        cfg.validate().expect("valid");
    }

    #[test]
    fn default_config_needs_a_secret() {
        assert!(ServerConfig::default().validate().is_err());
    }
}
