use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;

use crate::models::user::SessionUser;

type HmacSha256 = Hmac<Sha256>;

/// Name of the browser session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Per-browser server-side state, keyed by an opaque session id.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Display subset of the authenticated user, set on each profile view.
    pub user: Option<SessionUser>,
    /// Provider access token from the last code exchange.
    pub access_token: Option<String>,
    /// One-shot gate: set after the first (attempted) ledger write of this
    /// session, cleared on logout.
    pub signup_recorded: bool,
    /// CSRF state for the in-flight OAuth redirect, if any.
    pub oauth_state: Option<String>,
    /// One-shot message rendered on the next landing page view.
    pub flash: Option<String>,
}

/// Sessions idle longer than this are swept on the next create.
const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Hard cap on live sessions; the least recently seen goes first when hit.
const MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

/// In-memory session store with HMAC-signed cookie values.
///
/// The cookie carries `<id>.<hmac-sha256-hex>`; a value whose signature does
/// not verify resolves to no session at all. Idle sessions are swept on
/// create so the map cannot grow without bound.
pub struct SessionStore {
    secret: Vec<u8>,
    ttl: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(secret: &str) -> Self {
        Self::with_limits(secret, SESSION_TTL, MAX_SESSIONS)
    }

    pub fn with_limits(secret: &str, ttl: Duration, max_sessions: usize) -> Self {
        SessionStore {
            secret: secret.as_bytes().to_vec(),
            ttl,
            max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    fn sign(&self, id: &str) -> String {
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Signed value stored in the browser cookie.
    pub fn cookie_value(&self, id: &str) -> String {
        format!("{}.{}", id, self.sign(id))
    }

    /// Full `Set-Cookie` header value for a session id.
    pub fn set_cookie(&self, id: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            self.cookie_value(id)
        )
    }

    /// Verify a signed cookie value, returning the session id if the
    /// signature checks out.
    pub fn verify_cookie(&self, value: &str) -> Option<String> {
        let (id, sig_hex) = value.split_once('.')?;
        let sig = hex::decode(sig_hex).ok()?;
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        mac.verify_slice(&sig).ok()?;
        Some(id.to_string())
    }

    /// Extract and verify the session id from the request's Cookie header.
    pub fn session_id_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let cookies = headers.get(COOKIE)?.to_str().ok()?;
        for pair in cookies.split(';') {
            let pair = pair.trim();
            if let Some(rest) = pair.strip_prefix(SESSION_COOKIE) {
                if let Some(value) = rest.strip_prefix('=') {
                    return self.verify_cookie(value);
                }
            }
        }
        None
    }

    /// Create a fresh empty session and return its id.
    ///
    /// Sweeps idle sessions first and evicts the least recently seen one
    /// when the store is at capacity.
    pub async fn create(&self) -> String {
        let id = hex::encode(rand::random::<[u8; 16]>());
        let mut sessions = self.sessions.write().await;

        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.ttl);
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
            }
        }

        sessions.insert(
            id.clone(),
            SessionEntry {
                session: Session::default(),
                last_seen: Instant::now(),
            },
        );
        id
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// Mutate a session in place. Returns false if the id is unknown.
    pub async fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        match self.sessions.write().await.get_mut(id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                f(&mut entry.session);
                true
            }
            None => false,
        }
    }

    /// Take the flash message, clearing it.
    pub async fn take_flash(&self, id: &str) -> Option<String> {
        self.sessions
            .write()
            .await
            .get_mut(id)
            .and_then(|entry| entry.session.flash.take())
    }
}
