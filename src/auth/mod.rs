pub mod oauth;

pub use oauth::{GoogleClient, OAuthError};
