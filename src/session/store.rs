//! Cookie-backed session store.
//!
//! # Responsibilities
//! - Seal the session map into the session cookie and open it again
//! - Fail open to an anonymous session on any decode problem
//! - Login, logout and logged-in checks on top of one decode primitive
//!
//! # Design Decisions
//! - No server-side table: the cookie is the whole session
//! - The issue time is refreshed on every save (sliding expiration)
//! - Cookie age is enforced on decode as well as by the browser

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::security::crypto::{CookieCrypto, EncryptError};
use crate::session::cookie::{find_cookie, put_set_cookie, CookieAttributes};

/// Key holding the logged-in user's name.
pub const USERNAME_KEY: &str = "username";

/// Tolerated clock skew for cookies issued "in the future".
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Errors raised while loading or saving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session cookie")]
    Invalid,

    #[error("failed to serialize session: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Encrypt(#[from] EncryptError),

    #[error("session cookie is not a valid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

/// One browser's session state.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: String,
    values: BTreeMap<String, Value>,
    is_new: bool,
}

impl Session {
    /// A fresh, anonymous session.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            values: BTreeMap::new(),
            is_new: true,
        }
    }

    /// Opaque identifier, stable across saves until rotated.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when no cookie backed this session.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Value of `key` when it holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name of the logged-in user, if any.
    pub fn username(&self) -> Option<&str> {
        self.get_str(USERNAME_KEY)
    }

    /// Issue a new identifier, keeping the values.
    pub fn rotate_id(&mut self) {
        self.id = Uuid::new_v4().to_string();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Sealed cookie payload.
#[derive(Serialize, Deserialize)]
struct Payload {
    id: String,
    iat: u64,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

struct Inner {
    crypto: CookieCrypto,
    cookie: CookieAttributes,
}

/// Session store backed by a single encrypted cookie.
///
/// Cheap to clone; all clones share the same keys.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Build a store from resolved configuration.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                crypto: CookieCrypto::new(config.secret.expose()),
                cookie: CookieAttributes {
                    name: config.cookie_name.clone(),
                    path: "/".to_string(),
                    max_age_secs: config.max_age_secs,
                    http_only: true,
                    secure: config.secure,
                },
            }),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.inner.cookie.name
    }

    /// Decode the session cookie. `Ok(None)` means no cookie was sent.
    fn decode(&self, request: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let Some(value) = find_cookie(request, self.cookie_name()) else {
            return Ok(None);
        };
        self.open(value).map(Some)
    }

    fn open(&self, value: &str) -> Result<Session, SessionError> {
        let plaintext = self
            .inner
            .crypto
            .decrypt(self.cookie_name(), value)
            .ok_or(SessionError::Invalid)?;
        let payload: Payload =
            serde_json::from_slice(&plaintext).map_err(|_| SessionError::Invalid)?;

        let now = unix_now();
        if payload.iat > now + MAX_CLOCK_SKEW_SECS
            || now.saturating_sub(payload.iat) > self.inner.cookie.max_age_secs
        {
            return Err(SessionError::Invalid);
        }

        Ok(Session {
            id: payload.id,
            values: payload.values,
            is_new: false,
        })
    }

    /// Strict load: a missing cookie yields a fresh session, an invalid one
    /// is an error.
    pub fn load(&self, request: &HeaderMap) -> Result<Session, SessionError> {
        Ok(self.decode(request)?.unwrap_or_default())
    }

    /// Fail-open load: any problem with the cookie yields an anonymous session.
    pub fn get(&self, request: &HeaderMap) -> Session {
        match self.decode(request) {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding session cookie");
                Session::new()
            }
        }
    }

    /// Seal `session` into a cookie value.
    pub fn encode(&self, session: &Session) -> Result<String, SessionError> {
        self.encode_at(session, unix_now())
    }

    pub(crate) fn encode_at(&self, session: &Session, issued_at: u64) -> Result<String, SessionError> {
        let payload = Payload {
            id: session.id.clone(),
            iat: issued_at,
            values: session.values.clone(),
        };
        let plaintext = serde_json::to_vec(&payload)?;
        Ok(self.inner.crypto.encrypt(self.cookie_name(), &plaintext)?)
    }

    /// `Set-Cookie` header value for an already sealed cookie value.
    pub fn set_cookie_header(&self, value: &str) -> Result<HeaderValue, SessionError> {
        Ok(HeaderValue::from_str(&self.inner.cookie.set_cookie(value))?)
    }

    /// Persist `session` by issuing a fresh `Set-Cookie` on `response`.
    pub fn save(&self, response: &mut HeaderMap, session: &Session) -> Result<(), SessionError> {
        let value = self.encode(session)?;
        let header = self.set_cookie_header(&value)?;
        put_set_cookie(response, self.cookie_name(), header);
        Ok(())
    }

    /// Mark the session as belonging to `username`.
    ///
    /// The identifier is rotated so a session planted before login cannot be
    /// reused afterwards.
    pub fn login(
        &self,
        response: &mut HeaderMap,
        request: &HeaderMap,
        username: &str,
    ) -> Result<(), SessionError> {
        let mut session = self.load(request)?;
        session.rotate_id();
        session.insert(USERNAME_KEY, username);
        self.save(response, &session)
    }

    /// Clear every key of the session and re-issue the cookie.
    pub fn logout(&self, response: &mut HeaderMap, request: &HeaderMap) -> Result<(), SessionError> {
        let mut session = self.load(request)?;
        session.clear();
        self.save(response, &session)
    }

    fn authenticated(&self, request: &HeaderMap) -> Option<Session> {
        let session = self.get(request);
        session.username().is_some().then_some(session)
    }

    /// Logged-in check that also refreshes the cookie.
    ///
    /// Every positive check re-issues the cookie with a new issue time, so an
    /// active user's session never expires.
    pub fn is_logged_in(&self, response: &mut HeaderMap, request: &HeaderMap) -> bool {
        match self.authenticated(request) {
            Some(session) => {
                if let Err(e) = self.save(response, &session) {
                    tracing::warn!(error = %e, "Failed to refresh session cookie");
                }
                true
            }
            None => false,
        }
    }

    /// Side-effect free logged-in check.
    pub fn logged_in(&self, request: &HeaderMap) -> bool {
        self.authenticated(request).is_some()
    }

    /// Logged-in user's name, or an empty string.
    pub fn logged_in_user(&self, request: &HeaderMap) -> String {
        self.authenticated(request)
            .and_then(|s| s.username().map(str::to_string))
            .unwrap_or_default()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
