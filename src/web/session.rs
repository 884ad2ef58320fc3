//! Signed cookie sessions with one-shot flash messages.
//!
//! The whole session lives client-side in one cookie:
//! `hex(json payload) "." hex(hmac-sha256(hex payload))`. A cookie that is
//! malformed or whose signature doesn't verify is treated as no session.

use super::AppState;
use super::error::AppError;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use hmac::{Hmac, Mac};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::{Arc, Mutex, PoisonError};

type HmacSha256 = Hmac<Sha256>;

pub const COOKIE_NAME: &str = "session";

/// How long a "stay logged in" session survives: 31 days
pub const PERMANENT_MAX_AGE_SECS: u64 = 31 * 24 * 60 * 60;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub permanent: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    data: SessionData,
    modified: bool,
}

/// The current request's session. Cloning shares the same state, so the
/// middleware sees every change a handler makes.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    #[must_use]
    pub fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data,
                modified: false,
            })),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.with(|inner| inner.data.logged_in)
    }

    /// Marks the session as authenticated and keeps it beyond the browser session
    pub fn log_in(&self) {
        self.with(|inner| {
            inner.data.logged_in = true;
            inner.data.permanent = true;
            inner.modified = true;
        });
    }

    pub fn log_out(&self) {
        self.with(|inner| {
            inner.data.logged_in = false;
            inner.modified = true;
        });
    }

    /// Queues a message for the next rendered page
    pub fn flash(&self, message: impl Into<String>) {
        let message = message.into();
        self.with(|inner| {
            inner.data.flashes.push(message);
            inner.modified = true;
        });
    }

    /// Drains pending flash messages. Each message is shown once.
    #[must_use]
    pub fn take_flashes(&self) -> Vec<String> {
        self.with(|inner| {
            if inner.data.flashes.is_empty() {
                return Vec::new();
            }
            inner.modified = true;
            std::mem::take(&mut inner.data.flashes)
        })
    }

    // Payload to write back, only if something changed
    fn changes(&self) -> Option<SessionData> {
        self.with(|inner| inner.modified.then(|| inner.data.clone()))
    }
}

fn mac(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length")
}

/// Serializes and signs session data into a cookie value.
#[must_use]
pub fn encode(data: &SessionData, key: &[u8]) -> String {
    // Serializing plain strings and bools to JSON cannot fail
    let json = serde_json::to_vec(data).unwrap_or_default();
    let payload = hex::encode(json);

    let mut mac = mac(key);
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("{payload}.{signature}")
}

/// Verifies and deserializes a cookie value. Returns `None` for anything
/// tampered, truncated or signed with another key.
#[must_use]
pub fn decode(value: &str, key: &[u8]) -> Option<SessionData> {
    let (payload, signature) = value.split_once('.')?;
    let signature = hex::decode(signature).ok()?;

    let mut mac = mac(key);
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let json = hex::decode(payload).ok()?;
    serde_json::from_slice(&json).ok()
}

/// Builds the full `Set-Cookie` header value for `data`
#[must_use]
pub fn set_cookie(data: &SessionData, key: &[u8]) -> String {
    let mut cookie = format!(
        "{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
        encode(data, key)
    );
    if data.permanent {
        cookie.push_str(&format!("; Max-Age={PERMANENT_MAX_AGE_SECS}"));
    }
    cookie
}

/// Finds the value of cookie `name` among the request's `Cookie` headers
#[must_use]
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Middleware: loads the session before the handler runs and writes it back
/// afterwards if the handler changed it.
pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let key = state.config.secret_key.as_bytes();

    let data = match cookie_value(request.headers(), COOKIE_NAME) {
        Some(value) => decode(value, key).unwrap_or_else(|| {
            debug!("Ignoring session cookie with a bad signature");
            SessionData::default()
        }),
        None => SessionData::default(),
    };
    let session = Session::new(data);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(data) = session.changes() {
        match HeaderValue::from_str(&set_cookie(&data, key)) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Failed writing session cookie: {e}"),
        }
    }
    response
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AppError::MissingSession)
    }
}

/// Auth gate: extracting `Admin` succeeds only for a logged-in session and
/// otherwise redirects to the login page before the handler runs.
#[derive(Debug, Clone)]
pub struct Admin(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if session.is_logged_in() {
            Ok(Self(session))
        } else {
            Err(Redirect::to("/login").into_response())
        }
    }
}
