//! Client configuration

use std::env;

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Admin API
    pub api_url: String,
    pub api_token: String,

    // Transport
    pub request_timeout_ms: u64,
    pub max_retries: usize,

    // Catalog loading
    pub character_page_size: u32,
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("PLANDESK_API_URL")
            .map_err(|_| ConfigError::Missing("PLANDESK_API_URL"))?
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "PLANDESK_API_URL",
                reason: format!("expected an http(s) URL, got {:?}", api_url),
            });
        }

        let api_token =
            env::var("PLANDESK_API_TOKEN").map_err(|_| ConfigError::Missing("PLANDESK_API_TOKEN"))?;
        if api_token.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "PLANDESK_API_TOKEN",
                reason: "must not be empty".to_string(),
            });
        }

        let character_page_size = parse_var("PLANDESK_CHARACTER_PAGE_SIZE", 100u32)?;
        if character_page_size == 0 {
            return Err(ConfigError::Invalid {
                var: "PLANDESK_CHARACTER_PAGE_SIZE",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            api_url,
            api_token,
            request_timeout_ms: parse_var("PLANDESK_REQUEST_TIMEOUT_MS", 30_000u64)?,
            max_retries: parse_var("PLANDESK_MAX_RETRIES", 2usize)?,
            character_page_size,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "PLANDESK_API_URL",
        "PLANDESK_API_TOKEN",
        "PLANDESK_REQUEST_TIMEOUT_MS",
        "PLANDESK_MAX_RETRIES",
        "PLANDESK_CHARACTER_PAGE_SIZE",
    ];

    fn cleanup_config() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn setup_minimal_config() {
        cleanup_config();
        env::set_var("PLANDESK_API_URL", "https://admin.example.com/api/");
        env::set_var("PLANDESK_API_TOKEN", "test-token");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url, "https://admin.example.com/api");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.character_page_size, 100);

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_missing_required() {
        cleanup_config();
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("PLANDESK_API_URL"))
        ));

        env::set_var("PLANDESK_API_URL", "http://localhost:8080");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("PLANDESK_API_TOKEN"))
        ));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        setup_minimal_config();

        env::set_var("PLANDESK_MAX_RETRIES", "lots");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                var: "PLANDESK_MAX_RETRIES",
                ..
            })
        ));
        env::remove_var("PLANDESK_MAX_RETRIES");

        env::set_var("PLANDESK_CHARACTER_PAGE_SIZE", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                var: "PLANDESK_CHARACTER_PAGE_SIZE",
                ..
            })
        ));
        env::remove_var("PLANDESK_CHARACTER_PAGE_SIZE");

        env::set_var("PLANDESK_API_URL", "admin.example.com");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                var: "PLANDESK_API_URL",
                ..
            })
        ));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        setup_minimal_config();
        env::set_var("PLANDESK_REQUEST_TIMEOUT_MS", "5000");
        env::set_var("PLANDESK_MAX_RETRIES", "0");
        env::set_var("PLANDESK_CHARACTER_PAGE_SIZE", "25");

        let config = Config::from_env().unwrap();
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.character_page_size, 25);

        cleanup_config();
    }
}
