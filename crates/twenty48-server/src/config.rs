//! Server configuration from environment variables.

use anyhow::Context;
use std::net::SocketAddr;
use std::num::NonZeroUsize;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LEADERBOARD_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => panic!("default leaderboard size is zero"),
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `SERVER_ADDR`
    pub addr: SocketAddr,
    /// `LEADERBOARD_SIZE`: entries returned per leaderboard request
    pub leaderboard_size: NonZeroUsize,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()
            .context("SERVER_ADDR must be a socket address")?;

        let leaderboard_size = match lookup("LEADERBOARD_SIZE") {
            Some(size) => size
                .parse()
                .context("LEADERBOARD_SIZE must be a positive integer")?,
            None => DEFAULT_LEADERBOARD_SIZE,
        };

        Ok(Self {
            addr,
            leaderboard_size,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[("SERVER_ADDR", "127.0.0.1:9000"), ("LEADERBOARD_SIZE", "25")]).unwrap();
        assert_eq!(cfg.addr.port(), 9000);
        assert_eq!(cfg.leaderboard_size.get(), 25);
    }

    #[test]
    fn test_bad_values() {
        assert!(config(&[("SERVER_ADDR", "nowhere")]).is_err());
        assert!(config(&[("LEADERBOARD_SIZE", "-3")]).is_err());
    }

    #[test]
    fn test_zero_leaderboard_size_rejected() {
        let err = config(&[("LEADERBOARD_SIZE", "0")]).unwrap_err();
        assert!(err.to_string().contains("LEADERBOARD_SIZE"));
        assert!(config(&[("LEADERBOARD_SIZE", "1")]).is_ok());
    }
}
