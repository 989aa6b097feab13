//! Storefront configuration loaded from environment variables.
//!
//! All settings have defaults so the storefront can start with zero
//! configuration for local development.

use std::net::SocketAddr;

use tese_client::ClientConfig;

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Socket address for the HTTP (axum) server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8000`
    pub http_addr: SocketAddr,

    /// Env: `SITE_NAME`
    /// Default: `"tese.io"`
    pub site_name: String,

    /// Region used for product search when the request names none.
    /// Env: `DEFAULT_REGION`
    pub default_region: Option<String>,

    /// Country for the default listing filter when the request names none.
    /// Env: `DEFAULT_COUNTRY`
    pub default_country: Option<String>,

    /// Currency for the default listing filter when the request names none.
    /// Env: `DEFAULT_CURRENCY`
    pub default_currency: Option<String>,

    /// Backend and chat settings.
    pub client: ClientConfig,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8000).into(),
            site_name: "tese.io".to_string(),
            default_region: None,
            default_country: None,
            default_currency: None,
            client: ClientConfig::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            client: ClientConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(name) = lookup("SITE_NAME") {
            if !name.trim().is_empty() {
                config.site_name = name;
            }
        }

        if let Some(region) = lookup("DEFAULT_REGION") {
            if !region.is_empty() {
                config.default_region = Some(region);
            }
        }

        if let Some(country) = lookup("DEFAULT_COUNTRY") {
            if !country.trim().is_empty() {
                config.default_country = Some(country.trim().to_lowercase());
            }
        }

        if let Some(currency) = lookup("DEFAULT_CURRENCY") {
            if !currency.trim().is_empty() {
                config.default_currency = Some(currency.trim().to_lowercase());
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorefrontConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8000).into());
        assert_eq!(config.site_name, "tese.io");
        assert!(config.default_region.is_none());
    }

    #[test]
    fn test_invalid_addr_falls_back() {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "HTTP_ADDR" => Some("localhost".to_string()),
            "DEFAULT_REGION" => Some("reg_eu".to_string()),
            "DEFAULT_COUNTRY" => Some("PL".to_string()),
            "DEFAULT_CURRENCY" => Some(" ".to_string()),
            "MEDUSA_BACKEND_URL" => Some("https://api.tese.io/".to_string()),
            _ => None,
        });
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8000).into());
        assert_eq!(config.default_region.as_deref(), Some("reg_eu"));
        assert_eq!(config.default_country.as_deref(), Some("pl"));
        assert!(config.default_currency.is_none());
        assert_eq!(config.client.backend_url, "https://api.tese.io");
    }
}
