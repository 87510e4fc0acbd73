use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_AUTOSAVE_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Development => "propeller_api=debug,propeller_app=debug,tower_http=debug,info",
            Self::Production => "info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    pub google: Option<GoogleOAuthConfig>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub app_url: String,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub public_dir: PathBuf,
    pub autosave_interval: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let autosave_secs = match get("AUTOSAVE_INTERVAL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "AUTOSAVE_INTERVAL_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_AUTOSAVE_SECS,
        };

        let environment = get("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let local_url = format!("http://localhost:{}", port);

        let google = match (get("GOOGLE_CLIENT_ID"), get("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                callback_url: get("GOOGLE_CALLBACK_URL")
                    .unwrap_or_else(|| format!("{}/api/auth/google/callback", local_url)),
            }),
            _ => None,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            environment,
            allowed_origins,
            google,
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_base_url: get("OPENROUTER_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            app_url: get("APP_URL").unwrap_or(local_url),
            data_dir: get("DATA_DIR").unwrap_or_else(|| "data".into()).into(),
            uploads_dir: get("UPLOADS_DIR").unwrap_or_else(|| "uploads".into()).into(),
            public_dir: get("PUBLIC_DIR").unwrap_or_else(|| "public".into()).into(),
            autosave_interval: Duration::from_secs(autosave_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.google.is_none());
        assert!(config.openrouter_api_key.is_none());
        assert_eq!(config.openrouter_base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.app_url, "http://localhost:3000");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.autosave_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_google_requires_id_and_secret() {
        let config = config_from(&[("GOOGLE_CLIENT_ID", "id")]).unwrap();
        assert!(config.google.is_none());

        let config = config_from(&[
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("PORT", "8080"),
        ])
        .unwrap();
        let google = config.google.unwrap();
        assert_eq!(
            google.callback_url,
            "http://localhost:8080/api/auth/google/callback"
        );
    }

    #[test]
    fn test_production_origins() {
        let config = config_from(&[
            ("APP_ENV", "production"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,,"),
        ])
        .unwrap();
        assert!(config.environment.is_production());
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(config_from(&[("AUTOSAVE_INTERVAL_SECS", "0")]).is_err());
    }
}
