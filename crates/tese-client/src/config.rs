//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so a local storefront can start against a
//! backend on `localhost:9000` with no configuration at all.

use std::time::Duration;

use tese_shared::constants::{CHAT_PAGE_SIZE, CHAT_POLL_INTERVAL_MS};

/// Which chat backend the storefront talks to. Chosen once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatProviderKind {
    /// Direct Matrix homeserver access with backend-issued tokens.
    Matrix,
    /// TalkJS hosted conversations.
    TalkJs,
    /// No chat; chat entry points are hidden.
    Disabled,
}

impl ChatProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatProviderKind::Matrix => "matrix",
            ChatProviderKind::TalkJs => "talkjs",
            ChatProviderKind::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Commerce backend base URL.
    /// Env: `MEDUSA_BACKEND_URL`
    /// Default: `http://localhost:9000`
    pub backend_url: String,

    /// Publishable API key sent as `x-publishable-api-key`.
    /// Env: `MEDUSA_PUBLISHABLE_KEY`
    pub publishable_key: String,

    /// Matrix homeserver base URL, without trailing slash.
    /// Env: `MATRIX_HS_URL`
    pub matrix_homeserver_url: String,

    /// Env: `MATRIX_CHAT_ENABLED` (true/false)
    /// Default: `false`
    pub matrix_chat_enabled: bool,

    /// Env: `TALKJS_APP_ID`
    pub talkjs_app_id: Option<String>,

    /// Env: `TALKJS_SECRET_KEY`
    pub talkjs_secret_key: Option<String>,

    /// Env: `TALKJS_API_URL`
    /// Default: `https://api.talkjs.com`
    pub talkjs_api_url: String,

    /// Env: `CHAT_POLL_INTERVAL_MS`
    /// Default: `3000`
    pub chat_poll_interval: Duration,

    /// Env: `CHAT_PAGE_SIZE`
    /// Default: `50`
    pub chat_page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:9000".to_string(),
            publishable_key: String::new(),
            matrix_homeserver_url: String::new(),
            matrix_chat_enabled: false,
            talkjs_app_id: None,
            talkjs_secret_key: None,
            talkjs_api_url: "https://api.talkjs.com".to_string(),
            chat_poll_interval: Duration::from_millis(CHAT_POLL_INTERVAL_MS),
            chat_page_size: CHAT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("MEDUSA_BACKEND_URL") {
            config.backend_url = trim_base_url(&url);
        }

        if let Some(key) = lookup("MEDUSA_PUBLISHABLE_KEY") {
            config.publishable_key = key;
        }

        if let Some(url) = lookup("MATRIX_HS_URL") {
            config.matrix_homeserver_url = trim_base_url(&url);
        }

        if let Some(val) = lookup("MATRIX_CHAT_ENABLED") {
            config.matrix_chat_enabled = val == "true" || val == "1";
        }

        if let Some(id) = lookup("TALKJS_APP_ID") {
            if !id.is_empty() {
                config.talkjs_app_id = Some(id);
            }
        }

        if let Some(secret) = lookup("TALKJS_SECRET_KEY") {
            if !secret.is_empty() {
                config.talkjs_secret_key = Some(secret);
            }
        }

        if let Some(url) = lookup("TALKJS_API_URL") {
            config.talkjs_api_url = trim_base_url(&url);
        }

        if let Some(val) = lookup("CHAT_POLL_INTERVAL_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.chat_poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid CHAT_POLL_INTERVAL_MS, using default"),
            }
        }

        if let Some(val) = lookup("CHAT_PAGE_SIZE") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.chat_page_size = n,
                _ => tracing::warn!(value = %val, "Invalid CHAT_PAGE_SIZE, using default"),
            }
        }

        config
    }

    /// Matrix wins when enabled; TalkJS needs an app id.
    pub fn chat_provider(&self) -> ChatProviderKind {
        if self.matrix_chat_enabled {
            ChatProviderKind::Matrix
        } else if self.talkjs_app_id.is_some() {
            ChatProviderKind::TalkJs
        } else {
            ChatProviderKind::Disabled
        }
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.backend_url, "http://localhost:9000");
        assert_eq!(config.chat_poll_interval, Duration::from_millis(3000));
        assert_eq!(config.chat_page_size, 50);
        assert_eq!(config.chat_provider(), ChatProviderKind::Disabled);
    }

    #[test]
    fn test_homeserver_trailing_slash_trimmed() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MATRIX_HS_URL", "https://matrix.tese.io/"),
            ("MATRIX_CHAT_ENABLED", "true"),
        ]));
        assert_eq!(config.matrix_homeserver_url, "https://matrix.tese.io");
        assert_eq!(config.chat_provider(), ChatProviderKind::Matrix);
    }

    #[test]
    fn test_talkjs_selected_without_matrix() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MATRIX_CHAT_ENABLED", "false"),
            ("TALKJS_APP_ID", "tJ5X"),
        ]));
        assert_eq!(config.chat_provider(), ChatProviderKind::TalkJs);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CHAT_POLL_INTERVAL_MS", "soon"),
            ("CHAT_PAGE_SIZE", "0"),
        ]));
        assert_eq!(config.chat_poll_interval, Duration::from_millis(3000));
        assert_eq!(config.chat_page_size, 50);
    }
}
