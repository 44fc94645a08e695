#![allow(dead_code, unreachable_pub)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use cachet_container::{Codec, ContainerConfig, Data, Header, OsRandom, Payload};
use cachet_csrf::{Csrf, CsrfConfig};
use cachet_http::{CsrfSigner, CurrentSession, SessionState, csrf_layer, session_layer};
use cachet_session::SessionConfig;
use cookie::Cookie;
use tower::ServiceExt;

pub const SECRET_KEY: &str = "0123456789abcdef0123456789abcdef";
pub const USER_KEY: u32 = 1;

#[must_use]
pub fn session_config() -> SessionConfig {
    SessionConfig { container: ContainerConfig::with_key(SECRET_KEY), ..SessionConfig::default() }
}

/// Routes exercising every session operation a handler has.
/// # Panics
/// * If the session state cannot be built.
#[must_use]
pub fn session_app(config: SessionConfig) -> Router {
    session_router(SessionState::new(config, OsRandom::shared()).expect("session state"))
}

#[must_use]
pub fn session_router(state: SessionState) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .route("/login/{user}", post(login))
        .route("/logout", post(logout))
        .route("/touch", post(touch))
        .layer(from_fn_with_state(state, session_layer))
}

async fn whoami(session: CurrentSession) -> String {
    session.get_string(USER_KEY).unwrap_or_else(|| "anonymous".to_owned())
}

async fn login(session: CurrentSession, axum::extract::Path(user): axum::extract::Path<String>) -> String {
    match session.set_string(USER_KEY, user.clone()) {
        Ok(()) => user,
        Err(e) => e.to_string(),
    }
}

async fn logout(session: CurrentSession) -> &'static str {
    session.discard();
    "bye"
}

async fn touch(session: CurrentSession) -> String {
    session.touch();
    session.nonce().to_string()
}

/// A token sealed under [`SECRET_KEY`] with an arbitrary header, for states the
/// middleware itself never issues.
/// # Panics
/// * If the default container cannot encode.
#[must_use]
pub fn forge_token(header: Header, user: &str) -> String {
    let settings = ContainerConfig::with_key(SECRET_KEY).expand().expect("settings");
    let codec = Codec::new(&settings, OsRandom::shared()).expect("codec");
    let mut payload = Payload::default();
    payload.insert(USER_KEY, user.as_bytes());
    let token = codec.encode(&Data { header, payload }).expect("encode");
    String::from_utf8(token).expect("base64 token")
}

/// CSRF-protected routes plus a signing endpoint.
/// # Panics
/// * If the CSRF configuration is rejected.
#[must_use]
pub fn csrf_app() -> Router {
    Router::new()
        .route("/form", get(form))
        .route("/submit", post(submit).put(submit).delete(submit))
        .layer(from_fn_with_state(csrf(), csrf_layer))
}

/// A signer sharing the key of [`csrf_app`].
/// # Panics
/// * If the CSRF configuration is rejected.
#[must_use]
pub fn csrf() -> Csrf {
    Csrf::new(&CsrfConfig::with_key(SECRET_KEY), OsRandom::shared()).expect("csrf")
}

async fn form(CsrfSigner(csrf): CsrfSigner, headers: axum::http::HeaderMap) -> String {
    let Some(source) = cachet_http::real_ip(&headers, None) else {
        return "unknown client".to_owned();
    };
    csrf.sign_url_str(&source.to_string(), "/submit?item=7").unwrap_or_else(|e| e.to_string())
}

async fn submit() -> &'static str {
    "accepted"
}

/// Sends `request` through `app`.
/// # Panics
/// * If the service fails.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("infallible router")
}

/// # Panics
/// * If the body cannot be read.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// Every `Set-Cookie` of `response`, parsed.
#[must_use]
pub fn set_cookies(response: &Response<Body>) -> Vec<Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_owned()).ok())
        .collect()
}
