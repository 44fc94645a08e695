use crate::error::HttpError;
use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cachet_csrf::{Csrf, CsrfError};
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, warn};

/// Rejects protected requests without a valid token and exposes [`Csrf`] to handlers.
///
/// The token travels in the configured query parameter; the caller is the real client
/// address. Routers served without connect info fall back to the forwarding headers.
/// Inside nested routers the subject is the URI the client requested, before the mount
/// prefix was stripped.
pub async fn csrf_layer(State(csrf): State<Csrf>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    if csrf.protects(&parts.method) {
        let uri = parts.extensions.get::<OriginalUri>().map_or(&parts.uri, |OriginalUri(uri)| uri);
        if let Err(e) = csrf.validate_request(&parts.headers, uri, peer(&parts)) {
            if matches!(e, CsrfError::MissingSource { .. }) {
                warn!(error = %e, path = uri.path(), "CSRF check without a client address, is ConnectInfo enabled?");
            } else {
                debug!(error = %e, method = %parts.method, path = uri.path(), "CSRF token rejected");
            }
            return HttpError::from(e).into_response();
        }
    }

    parts.extensions.insert(csrf);
    next.run(Request::from_parts(parts, body)).await
}

/// Socket address of the peer, when the server records it.
#[must_use]
pub fn peer(parts: &Parts) -> Option<IpAddr> {
    parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip())
}

/// Extracts the [`Csrf`] handle installed by [`csrf_layer`], e.g. to sign form actions.
#[derive(Debug, Clone)]
pub struct CsrfSigner(pub Csrf);

impl<S: Send + Sync> FromRequestParts<S> for CsrfSigner {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Csrf>().cloned().map(Self).ok_or_else(|| HttpError::MissingExtension {
            message: "csrf_layer is not installed".into(),
            context: None,
        })
    }
}
