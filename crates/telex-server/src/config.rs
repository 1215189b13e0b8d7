use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

const DEV_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("TELEX_JWT_SECRET").unwrap_or_else(|| {
            warn!("TELEX_JWT_SECRET not set, using the development secret");
            DEV_SECRET.into()
        });
        let db_path = get("TELEX_DB_PATH").unwrap_or_else(|| "telex.db".into());
        let host = get("TELEX_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("TELEX_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("TELEX_PORT must be a port number")?;

        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            db_path: PathBuf::from(db_path),
            jwt_secret,
            addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("telex.db"));
        assert_eq!(config.jwt_secret, DEV_SECRET);
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("TELEX_DB_PATH", "/var/lib/telex/chat.db"),
            ("TELEX_JWT_SECRET", "hunter2"),
            ("TELEX_HOST", "127.0.0.1"),
            ("TELEX_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/telex/chat.db"));
        assert_eq!(config.jwt_secret, "hunter2");
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(config(&[("TELEX_PORT", "eighty")]).is_err());
    }
}
