//! HTTP server configuration.
//!
//! `BIND_ADDR` (default `0.0.0.0`) and `PORT` (default `3000`). Invalid values are
//! logged and replaced by their defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let ip = match lookup("BIND_ADDR") {
            None => defaults.bind_addr.ip(),
            Some(raw) => raw.trim().parse::<IpAddr>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "BIND_ADDR is not an IP address, using default");
                defaults.bind_addr.ip()
            }),
        };

        let port = match lookup("PORT") {
            None => defaults.bind_addr.port(),
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "PORT is not a valid port, using default");
                defaults.bind_addr.port()
            }),
        };

        Self {
            bind_addr: SocketAddr::new(ip, port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ApiConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn reads_address_and_port() {
        let config = ApiConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("127.0.0.1".to_string()),
            "PORT" => Some("8080".to_string()),
            _ => None,
        });
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn invalid_port_falls_back() {
        let config = ApiConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
    }
}
