use crate::error::HttpError;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cachet_container::SharedRandom;
use cachet_session::{
    Exchange, Session, SessionConfig, SessionError, SessionOption, SessionStore, Sessions, select_store,
};
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// State of [`session_layer`]: the session handle and its transport settings.
#[derive(Debug, Clone)]
pub struct SessionState {
    inner: Arc<SessionStateInner>,
}

#[derive(Debug)]
pub struct SessionStateInner {
    pub sessions: Sessions,
    pub config: SessionConfig,
}

impl SessionState {
    /// # Errors
    /// Propagates configuration and key loading failures.
    pub fn new(config: SessionConfig, rand: SharedRandom) -> Result<Self, SessionError> {
        let sessions = Sessions::from_config(&config, rand)?;
        Ok(Self::from_parts(sessions, config))
    }

    #[must_use]
    pub fn from_parts(sessions: Sessions, config: SessionConfig) -> Self {
        Self { inner: Arc::new(SessionStateInner { sessions, config }) }
    }

    /// Adds options applied to every session this state creates.
    #[must_use]
    pub fn with_options(self, options: impl IntoIterator<Item = SessionOption>) -> Self {
        let sessions = self.inner.sessions.clone().with_options(options);
        Self::from_parts(sessions, self.inner.config.clone())
    }
}

impl Deref for SessionState {
    type Target = SessionStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The request's session, as seen by handlers.
///
/// Mutations are saved after the handler returns. [`CurrentSession::discard`] asks the
/// transport to forget the session instead.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    session: Arc<Session>,
    discarded: Arc<AtomicBool>,
}

impl CurrentSession {
    fn new(session: Arc<Session>) -> Self {
        Self { session, discarded: Arc::new(AtomicBool::new(false)) }
    }

    /// Drops the session on the client when the response is sent.
    pub fn discard(&self) {
        self.discarded.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_discarded(&self) -> bool {
        self.discarded.load(Ordering::Acquire)
    }
}

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| HttpError::MissingExtension {
            message: "session_layer is not installed".into(),
            context: None,
        })
    }
}

/// Loads, validates and refreshes the session, then saves it if the handler advanced
/// its nonce.
///
/// Unreadable sessions are replaced with fresh ones. Expired, incompatible or rejected
/// sessions are replaced too, and the replacement is always written back so the client
/// drops the stale token. Any other failure ends the request with a `500`.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, session_layer));
/// ```
pub async fn session_layer(State(state): State<SessionState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let mut exchange = Exchange::from_parts(&parts);

    let (store, replaced) = match establish(&state, &exchange) {
        Ok(established) => established,
        Err(e) => return HttpError::from(e).into_response(),
    };
    let session = Arc::clone(store.session());

    let loaded_nonce = session.nonce();
    if session.refresh_required() {
        let header = session.header();
        debug!(valid_after = %header.valid_after, valid_before = %header.valid_before, "Session refresh required");
        if let Err(e) = session.refresh() {
            return HttpError::from(e).into_response();
        }
    }

    let current = CurrentSession::new(Arc::clone(&session));
    parts.extensions.insert(current.clone());

    let mut response = next.run(Request::from_parts(parts, body)).await;
    if response.status().is_informational() {
        return response;
    }

    let outcome = if current.is_discarded() {
        debug!("Session discarded");
        store.discard(&mut exchange)
    } else if replaced {
        debug!(nonce = session.nonce(), "Reissuing replaced session");
        store.save(&mut exchange)
    } else if session.nonce() == loaded_nonce {
        Ok(())
    } else {
        debug!(previous_nonce = loaded_nonce, current_nonce = session.nonce(), "Session nonce advanced");
        store.save(&mut exchange)
    };
    if let Err(e) = outcome {
        return HttpError::from(e).into_response();
    }

    for cookie in exchange.take_cookies() {
        match HeaderValue::try_from(cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            },
            Err(e) => {
                return HttpError::from(SessionError::Internal {
                    message: e.to_string().into(),
                    context: Some("set-cookie".into()),
                })
                .into_response();
            },
        }
    }
    response
}

/// The request's store, and whether a loaded session was thrown away as invalid.
fn establish(state: &SessionState, exchange: &Exchange) -> Result<(Box<dyn SessionStore>, bool), SessionError> {
    let store = select_store(&state.config, exchange, Arc::new(state.sessions.create()?))?;

    let found = match store.load(exchange) {
        Ok(found) => found,
        Err(e) if e.is_format_or_decrypt() => {
            warn!(error = %e, "Failed to load session, continuing with a new one");
            false
        },
        Err(e) => return Err(e),
    };
    if !found {
        return Ok((store, false));
    }

    match store.session().validate() {
        Ok(()) => Ok((store, false)),
        Err(e) if e.is_invalid() => {
            warn!(error = %e, "Session failed validation, making a new one");
            let fresh = select_store(&state.config, exchange, Arc::new(store.session().renew()?))?;
            Ok((fresh, true))
        },
        Err(e) => Err(e),
    }
}
