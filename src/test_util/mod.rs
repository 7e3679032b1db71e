//! Shared builders for tests. The identity-provider mock lives in the
//! integration tests; this module only wires up config and state.

use std::path::Path;
use std::sync::Arc;

use crate::config::{
    AdminConfig, Config, LedgerConfig, LoggingConfig, OAuthProvider, SessionConfig,
};
use crate::{AppState, GoogleClient, SessionStore, SignupLedger};

pub fn test_config(ledger_path: &Path, admin_token: Option<&str>) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8080,
        public_base_url: "http://localhost:8080".to_string(),
        oauth: OAuthProvider::Configured {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
        },
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
        },
        admin: AdminConfig {
            token: admin_token.map(String::from),
        },
        ledger: LedgerConfig {
            path: ledger_path.to_path_buf(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

/// State wired to a provider at `provider_base_url` (usually a mock server).
pub fn test_state(config: Config, provider_base_url: &str) -> Arc<AppState> {
    let client = match &config.oauth {
        OAuthProvider::Configured {
            client_id,
            client_secret,
        } => Some(
            GoogleClient::new(client_id, client_secret, &config.redirect_uri())
                .with_base_url(provider_base_url),
        ),
        OAuthProvider::Unconfigured => None,
    };
    let sessions = SessionStore::new(&config.session.secret);
    let ledger = SignupLedger::new(config.ledger.path.clone());

    Arc::new(AppState {
        config,
        oauth_client: client,
        sessions,
        ledger,
    })
}
