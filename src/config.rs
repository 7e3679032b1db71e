use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8080)
    pub port: u16,
    /// External base URL used to build the OAuth redirect URI.
    pub public_base_url: String,
    /// Google OAuth credentials, resolved once at startup.
    pub oauth: OAuthProvider,
    pub session: SessionConfig,
    pub admin: AdminConfig,
    pub ledger: LedgerConfig,
    pub logging: LoggingConfig,
}

/// Whether Google OAuth credentials were supplied to this deployment.
///
/// Resolved once at startup; handlers that need the provider receive the
/// built client, never re-read the environment.
#[derive(Debug, Clone)]
pub enum OAuthProvider {
    Configured {
        client_id: String,
        client_secret: String,
    },
    Unconfigured,
}

impl OAuthProvider {
    pub fn is_configured(&self) -> bool {
        matches!(self, OAuthProvider::Configured { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret used to sign session cookies.
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Bearer token for the signup export endpoint. Export is disabled
    /// when unset.
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Path of the signup CSV file.
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let oauth = match (
            env::var("GOOGLE_OAUTH_CLIENT_ID"),
            env::var("GOOGLE_OAUTH_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                OAuthProvider::Configured {
                    client_id,
                    client_secret,
                }
            }
            _ => OAuthProvider::Unconfigured,
        };

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            public_base_url,
            oauth,
            session: SessionConfig {
                secret: env::var("SESSION_SECRET")
                    .map_err(|_| ConfigError::MissingEnvVar("SESSION_SECRET"))?,
            },
            admin: AdminConfig {
                token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            },
            ledger: LedgerConfig {
                path: env::var("SIGNUPS_CSV_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./signups.csv")),
            },
            logging: LoggingConfig {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }

    /// The exact callback URL to register with the identity provider.
    pub fn redirect_uri(&self) -> String {
        format!(
            "{}/login/google/authorized",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid port number")]
    InvalidPort,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(oauth: OAuthProvider) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_base_url: "https://portal.example.com".to_string(),
            oauth,
            session: SessionConfig {
                secret: "test-secret".to_string(),
            },
            admin: AdminConfig { token: None },
            ledger: LedgerConfig {
                path: PathBuf::from("./signups.csv"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_redirect_uri_appends_callback_path() {
        let config = base_config(OAuthProvider::Unconfigured);
        assert_eq!(
            config.redirect_uri(),
            "https://portal.example.com/login/google/authorized"
        );
    }

    #[test]
    fn test_redirect_uri_strips_trailing_slash() {
        let mut config = base_config(OAuthProvider::Unconfigured);
        config.public_base_url = "https://portal.example.com/".to_string();
        assert_eq!(
            config.redirect_uri(),
            "https://portal.example.com/login/google/authorized"
        );
    }

    #[test]
    fn test_oauth_provider_configured() {
        let provider = OAuthProvider::Configured {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        assert!(provider.is_configured());
        assert!(!OAuthProvider::Unconfigured.is_configured());
    }
}
