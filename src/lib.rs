pub mod auth;
pub mod config;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod routes;
pub mod session;
pub mod test_util;

pub use auth::{GoogleClient, OAuthError};
pub use config::{Config, OAuthProvider};
pub use ledger::{LedgerError, SignupLedger};
pub use models::user::{AuthenticatedUser, SessionUser};
pub use session::{Session, SessionStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Present only when provider credentials were configured at startup.
    pub oauth_client: Option<GoogleClient>,
    pub sessions: SessionStore,
    pub ledger: SignupLedger,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let oauth_client = match &config.oauth {
            OAuthProvider::Configured {
                client_id,
                client_secret,
            } => Some(GoogleClient::new(
                client_id,
                client_secret,
                &config.redirect_uri(),
            )),
            OAuthProvider::Unconfigured => None,
        };
        let sessions = SessionStore::new(&config.session.secret);
        let ledger = SignupLedger::new(config.ledger.path.clone());

        AppState {
            config,
            oauth_client,
            sessions,
            ledger,
        }
    }
}
