use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cachet_csrf::CsrfError;
use cachet_session::SessionError;
use std::borrow::Cow;
use tracing::error;

pub const CSRF_REJECTED: &str = "CSRF token validation failed";
const INTERNAL: &str = "Internal Server Error";

/// Middleware failures, rendered without internal detail.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Session middleware error{}: {source}", format_context(.context))]
    Session { source: SessionError, context: Option<Cow<'static, str>> },

    #[error("CSRF middleware error{}: {source}", format_context(.context))]
    Csrf { source: CsrfError, context: Option<Cow<'static, str>> },

    /// A handler asked for state that no layer provided.
    #[error("Missing request extension{}: {message}", format_context(.context))]
    MissingExtension { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match &self {
            Self::Csrf { source, .. } if source.is_rejection() => {
                (StatusCode::BAD_REQUEST, CSRF_REJECTED).into_response()
            },
            _ => {
                error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL).into_response()
            },
        }
    }
}

impl From<SessionError> for HttpError {
    #[inline]
    fn from(source: SessionError) -> Self {
        Self::Session { source, context: None }
    }
}

impl From<CsrfError> for HttpError {
    #[inline]
    fn from(source: CsrfError) -> Self {
        Self::Csrf { source, context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_rejections_are_bad_requests() {
        let err = HttpError::from(CsrfError::SubjectMismatch { message: "x".into(), context: None });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn everything_else_is_an_opaque_500() {
        let err = HttpError::from(SessionError::from("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = HttpError::from(CsrfError::from("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
