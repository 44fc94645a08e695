use cachet_container::ContainerError;
use std::borrow::Cow;

#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    /// The token failed to decode, or is outside its window.
    #[error("CSRF token error{}: {source}", format_context(.context))]
    Container { source: ContainerError, context: Option<Cow<'static, str>> },

    /// The token was issued to a different caller.
    #[error("CSRF source mismatch{}: {message}", format_context(.context))]
    SourceMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The client address is unknown, so the token cannot be bound to a caller.
    #[error("CSRF source unknown{}: {message}", format_context(.context))]
    MissingSource { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The token was issued for a different target.
    #[error("CSRF subject mismatch{}: {message}", format_context(.context))]
    SubjectMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid URL{}: {message}", format_context(.context))]
    Url { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid CSRF configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal CSRF error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl CsrfError {
    /// Failures caused by the request rather than by the server setup.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        match self {
            Self::Container { source, .. } => source.is_recoverable(),
            Self::SourceMismatch { .. }
            | Self::MissingSource { .. }
            | Self::SubjectMismatch { .. }
            | Self::Url { .. } => true,
            Self::Configuration { .. } | Self::Internal { .. } => false,
        }
    }

    fn context_mut(&mut self) -> &mut Option<Cow<'static, str>> {
        match self {
            Self::Container { context, .. }
            | Self::SourceMismatch { context, .. }
            | Self::MissingSource { context, .. }
            | Self::SubjectMismatch { context, .. }
            | Self::Url { context, .. }
            | Self::Configuration { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }
}

pub trait CsrfErrorExt<T> {
    /// Sets the context of the error, if any.
    ///
    /// # Errors
    /// Returns the original error with the context attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, CsrfError>;
}

impl<T> CsrfErrorExt<T> for Result<T, CsrfError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            *e.context_mut() = Some(context.into());
            e
        })
    }
}

impl<T> CsrfErrorExt<T> for Result<T, ContainerError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, CsrfError> {
        self.map_err(|source| CsrfError::Container { source, context: Some(context.into()) })
    }
}

impl From<ContainerError> for CsrfError {
    #[inline]
    fn from(source: ContainerError) -> Self {
        Self::Container { source, context: None }
    }
}

impl From<http::uri::InvalidUri> for CsrfError {
    #[inline]
    fn from(e: http::uri::InvalidUri) -> Self {
        Self::Url { message: e.to_string().into(), context: None }
    }
}

impl From<http::uri::InvalidUriParts> for CsrfError {
    #[inline]
    fn from(e: http::uri::InvalidUriParts) -> Self {
        Self::Url { message: e.to_string().into(), context: None }
    }
}

impl From<&'static str> for CsrfError {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self::Internal { message: Cow::Borrowed(s), context: None }
    }
}

impl From<String> for CsrfError {
    #[inline]
    fn from(s: String) -> Self {
        Self::Internal { message: Cow::Owned(s), context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
