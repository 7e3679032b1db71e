//! Browser-facing pages: landing, the Google login flow, profile and logout.
//!
//! Pages are rendered as inline HTML; this service has no templating layer.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::models::user::SessionUser;
use crate::AppState;

/// Query parameters received on the OAuth callback.
#[derive(Debug, Deserialize)]
struct AuthorizedQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Reuse the caller's session if its cookie verifies, otherwise mint a new
/// one. Returns the id and whether a cookie still needs to be set.
async fn get_or_create_session(state: &AppState, headers: &HeaderMap) -> (String, bool) {
    if let Some(id) = state.sessions.session_id_from_headers(headers) {
        if state.sessions.get(&id).await.is_some() {
            return (id, false);
        }
    }
    (state.sessions.create().await, true)
}

/// Attach the signed session cookie to a response.
fn with_session_cookie(state: &AppState, id: &str, mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&state.sessions.set_cookie(id)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// GET / - Landing page; shows the login link when the provider is
/// configured and renders (and clears) any pending flash message.
async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let flash = match state.sessions.session_id_from_headers(&headers) {
        Some(id) => state.sessions.take_flash(&id).await,
        None => None,
    };

    Html(render_index(
        state.oauth_client.is_some(),
        flash.as_deref(),
    ))
    .into_response()
}

/// GET /login/google - Store a fresh CSRF state in the session and redirect
/// the browser to the provider's consent screen.
async fn login(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(client) = &state.oauth_client else {
        return Redirect::to("/").into_response();
    };

    let (session_id, created) = get_or_create_session(&state, &headers).await;
    let csrf_state = uuid::Uuid::new_v4().simple().to_string();
    state
        .sessions
        .update(&session_id, |s| s.oauth_state = Some(csrf_state.clone()))
        .await;

    let response = match client.authorize_url(&csrf_state) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            tracing::error!("Failed to build authorize URL: {}", e);
            state
                .sessions
                .update(&session_id, |s| {
                    s.flash = Some("Google sign-in is unavailable right now.".to_string())
                })
                .await;
            Redirect::to("/").into_response()
        }
    };

    if created {
        with_session_cookie(&state, &session_id, response)
    } else {
        response
    }
}

/// GET /login/google/authorized - OAuth callback: verify the CSRF state,
/// exchange the code for an access token and move on to the profile page.
async fn authorized(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AuthorizedQuery>,
) -> Response {
    let Some(client) = &state.oauth_client else {
        return Redirect::to("/").into_response();
    };

    // The callback only makes sense in the session that started the flow.
    let Some(session_id) = state.sessions.session_id_from_headers(&headers) else {
        return Redirect::to("/").into_response();
    };
    let Some(session) = state.sessions.get(&session_id).await else {
        return Redirect::to("/").into_response();
    };

    if let Some(error) = &query.error {
        tracing::warn!("Provider returned error on callback: {}", error);
        return flash_home(&state, &session_id, "Google sign-in was cancelled or failed.").await;
    }

    let expected_state = session.oauth_state;
    state
        .sessions
        .update(&session_id, |s| s.oauth_state = None)
        .await;
    match (&query.state, expected_state) {
        (Some(got), Some(expected)) if *got == expected => {}
        _ => {
            tracing::warn!("OAuth state mismatch on callback");
            return flash_home(&state, &session_id, "Sign-in session expired, please try again.")
                .await;
        }
    }

    let Some(code) = &query.code else {
        return flash_home(&state, &session_id, "Google sign-in was cancelled or failed.").await;
    };

    match client.exchange_code(code).await {
        Ok(access_token) => {
            state
                .sessions
                .update(&session_id, |s| s.access_token = Some(access_token))
                .await;
            Redirect::to("/profile").into_response()
        }
        Err(e) => {
            tracing::warn!("Code exchange failed: {}", e);
            flash_home(&state, &session_id, "Failed to complete Google sign-in.").await
        }
    }
}

/// Leave a flash message in the session and bounce to the landing page.
async fn flash_home(state: &AppState, session_id: &str, message: &str) -> Response {
    let message = message.to_string();
    state
        .sessions
        .update(session_id, |s| s.flash = Some(message))
        .await;
    Redirect::to("/").into_response()
}

/// GET /profile - Fetch userinfo, record the signup once per session and
/// render the profile page. Redirects to the provider login when the
/// session holds no token.
async fn profile(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(client) = &state.oauth_client else {
        let (session_id, created) = get_or_create_session(&state, &headers).await;
        let response =
            flash_home(&state, &session_id, "Google login is not configured on this host.").await;
        return if created {
            with_session_cookie(&state, &session_id, response)
        } else {
            response
        };
    };

    let session = match state.sessions.session_id_from_headers(&headers) {
        Some(id) => state.sessions.get(&id).await.map(|s| (id, s)),
        None => None,
    };
    let Some((session_id, session)) = session else {
        return Redirect::to("/login/google").into_response();
    };
    let Some(access_token) = session.access_token else {
        return Redirect::to("/login/google").into_response();
    };

    let user = match client.fetch_userinfo(&access_token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Userinfo fetch failed: {}", e);
            state
                .sessions
                .update(&session_id, |s| {
                    s.flash = Some("Failed to fetch user info from Google.".to_string())
                })
                .await;
            return Redirect::to("/").into_response();
        }
    };

    let session_user = SessionUser::from(&user);
    state
        .sessions
        .update(&session_id, |s| s.user = Some(session_user.clone()))
        .await;

    if !session.signup_recorded {
        // Best-effort: a failed write is logged and never blocks login. The
        // gate is set on the attempt either way, so one session produces at
        // most one row.
        if let Err(e) = state.ledger.record(&user) {
            tracing::error!("Failed to record signup: {}", e);
        }
        state
            .sessions
            .update(&session_id, |s| s.signup_recorded = true)
            .await;
    }

    Html(render_profile(&session_user)).into_response()
}

/// GET /logout - Revoke the stored provider token (best-effort), clear the
/// session and return to the landing page.
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, created) = get_or_create_session(&state, &headers).await;

    let access_token = state
        .sessions
        .get(&session_id)
        .await
        .and_then(|s| s.access_token);

    if let Some(client) = &state.oauth_client {
        // Token may already be absent or dead; logout succeeds regardless.
        if let Err(e) = client.revoke(access_token.as_deref()).await {
            tracing::debug!("Token revocation failed: {}", e);
        }
    }

    state
        .sessions
        .update(&session_id, |s| {
            s.user = None;
            s.access_token = None;
            s.signup_recorded = false;
            s.flash = Some("You have been logged out.".to_string());
        })
        .await;

    let response = Redirect::to("/").into_response();
    if created {
        with_session_cookie(&state, &session_id, response)
    } else {
        response
    }
}

/// GET /debug/redirect-uri - The exact callback URL to register with the
/// identity provider. Diagnostic only.
async fn debug_redirect_uri(State(state): State<Arc<AppState>>) -> String {
    match &state.oauth_client {
        Some(client) => client.redirect_uri().to_string(),
        None => "OAuth not configured (no client id/secret).".to_string(),
    }
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_index(oauth_configured: bool, flash: Option<&str>) -> String {
    let flash_html = match flash {
        Some(message) => format!("<p class=\"flash\">{}</p>", html_escape(message)),
        None => String::new(),
    };
    let login_html = if oauth_configured {
        "<p><a href=\"/login/google\">Sign in with Google</a></p>".to_string()
    } else {
        "<p>Google login is not configured on this host.</p>".to_string()
    };
    format!(
        "<!DOCTYPE html>\n<html><head><title>Signup Portal</title></head>\n\
         <body><h1>Welcome</h1>{}{}</body></html>",
        flash_html, login_html
    )
}

fn render_profile(user: &SessionUser) -> String {
    let name = html_escape(user.name.as_deref().unwrap_or("(no name)"));
    let email = html_escape(user.email.as_deref().unwrap_or("(no email)"));
    let picture_html = match &user.picture {
        Some(url) => format!("<img src=\"{}\" alt=\"profile picture\">", html_escape(url)),
        None => String::new(),
    };
    format!(
        "<!DOCTYPE html>\n<html><head><title>Profile</title></head>\n\
         <body><h1>{}</h1><p>{}</p>{}\
         <p><a href=\"/logout\">Log out</a></p></body></html>",
        name, email, picture_html
    )
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/profile", get(profile))
        .route("/logout", get(logout))
        .route("/debug/redirect-uri", get(debug_redirect_uri));

    // The login flow is only mounted when provider credentials exist; the
    // landing page explains the rest.
    if state.oauth_client.is_some() {
        router = router
            .route("/login/google", get(login))
            .route("/login/google/authorized", get(authorized));
    }

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_render_index_with_login_link() {
        let html = render_index(true, None);
        assert!(html.contains("/login/google"));
        assert!(!html.contains("not configured"));
    }

    #[test]
    fn test_render_index_unconfigured() {
        let html = render_index(false, None);
        assert!(html.contains("not configured"));
        assert!(!html.contains("/login/google\""));
    }

    #[test]
    fn test_render_index_shows_flash() {
        let html = render_index(true, Some("You have been logged out."));
        assert!(html.contains("You have been logged out."));
    }

    #[test]
    fn test_render_profile_escapes_user_fields() {
        let user = SessionUser {
            email: Some("a@example.com".to_string()),
            name: Some("<b>Alice</b>".to_string()),
            picture: None,
        };
        let html = render_profile(&user);
        assert!(html.contains("&lt;b&gt;Alice&lt;/b&gt;"));
        assert!(html.contains("a@example.com"));
        assert!(!html.contains("<img"));
    }
}
