use reqwest::{Client, Url};
use serde::Deserialize;

use crate::models::user::AuthenticatedUser;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Full userinfo scope URIs plus `openid`, matching what Google reports
/// back; requesting the short names triggers scope-change warnings.
const SCOPES: &str = "openid \
    https://www.googleapis.com/auth/userinfo.email \
    https://www.googleapis.com/auth/userinfo.profile";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid OAuth endpoint URL: {0}")]
    InvalidEndpoint(String),
    #[error("Token exchange failed with status {0}")]
    TokenExchange(u16),
    #[error("Userinfo fetch failed with status {0}")]
    Userinfo(u16),
}

/// Token response from the provider's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for Google's OAuth2 authorization-code flow.
///
/// Endpoint URLs are overridable so tests can point the whole flow at a
/// mock server.
pub struct GoogleClient {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    revoke_url: String,
}

impl GoogleClient {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        GoogleClient {
            http: Client::new(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            revoke_url: GOOGLE_REVOKE_URL.to_string(),
        }
    }

    /// Point every provider endpoint at `base` (for tests).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.auth_url = format!("{}/o/oauth2/v2/auth", base);
        self.token_url = format!("{}/token", base);
        self.userinfo_url = format!("{}/userinfo", base);
        self.revoke_url = format!("{}/revoke", base);
        self
    }

    /// The callback URL the provider will redirect back to.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Provider login entry point for a browser redirect, carrying the
    /// session's CSRF `state`.
    pub fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| OAuthError::InvalidEndpoint(e.to_string()))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::TokenExchange(response.status().as_u16()));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the authenticated user's profile from the userinfo endpoint.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<AuthenticatedUser, OAuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Userinfo(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Revoke a stored access token. Tolerant of "nothing to revoke":
    /// `None` succeeds immediately, and a provider rejection of an
    /// already-dead token is not an error.
    pub async fn revoke(&self, access_token: Option<&str>) -> Result<(), OAuthError> {
        let Some(token) = access_token else {
            return Ok(());
        };

        let response = self
            .http
            .post(&self.revoke_url)
            .form(&[("token", token)])
            .send()
            .await?;

        // Google answers 400 for tokens that are already invalid; the end
        // state is the same either way.
        tracing::debug!("Token revocation returned status {}", response.status());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GoogleClient {
        GoogleClient::new(
            "test-client-id",
            "test-client-secret",
            "http://localhost:8080/login/google/authorized",
        )
    }

    #[test]
    fn test_authorize_url_points_at_google() {
        let url = test_client().authorize_url("state123").unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
    }

    #[test]
    fn test_authorize_url_carries_flow_parameters() {
        let url = test_client().authorize_url("state123").unwrap();
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("state=state123"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Flogin%2Fgoogle%2Fauthorized"));
    }

    #[test]
    fn test_authorize_url_requests_openid_scopes() {
        let url = test_client().authorize_url("s").unwrap();
        assert!(url.contains("openid"));
        assert!(url.contains("userinfo.email"));
        assert!(url.contains("userinfo.profile"));
    }

    #[test]
    fn test_with_base_url_rewrites_endpoints() {
        let client = test_client().with_base_url("http://127.0.0.1:9999/");
        let url = client.authorize_url("s").unwrap();
        assert!(url.starts_with("http://127.0.0.1:9999/o/oauth2/v2/auth"));
    }

    #[tokio::test]
    async fn test_revoke_without_token_is_a_noop() {
        // No server involved at all; must not error.
        test_client().revoke(None).await.unwrap();
    }
}
