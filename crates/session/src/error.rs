use cachet_container::ContainerError;
use std::borrow::Cow;

/// Session, store and validator failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The underlying container failed to load, save or validate.
    #[error("Session container error{}: {source}", format_context(.context))]
    Container { source: ContainerError, context: Option<Cow<'static, str>> },

    /// A registered validator rejected the session.
    #[error("Session rejected{}: {message}", format_context(.context))]
    Validator { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid session configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal session error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl SessionError {
    /// Shorthand for validators.
    #[must_use]
    pub fn rejected(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validator { message: message.into(), context: None }
    }

    /// The stored token was unreadable or forged.
    #[must_use]
    pub const fn is_format_or_decrypt(&self) -> bool {
        match self {
            Self::Container { source, .. } => source.is_format_or_decrypt(),
            _ => false,
        }
    }

    /// The session decoded but must be discarded and reissued.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        match self {
            Self::Container { source, .. } => source.is_invalid(),
            Self::Validator { .. } => true,
            _ => false,
        }
    }

    /// Anything a request can survive by starting a fresh session.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.is_format_or_decrypt() || self.is_invalid()
    }

    fn context_mut(&mut self) -> &mut Option<Cow<'static, str>> {
        match self {
            Self::Container { context, .. }
            | Self::Validator { context, .. }
            | Self::Configuration { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }
}

pub trait SessionErrorExt<T> {
    /// Sets the context of the error, if any.
    ///
    /// # Errors
    /// Returns the original error with the context attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SessionError>;
}

impl<T> SessionErrorExt<T> for Result<T, SessionError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            *e.context_mut() = Some(context.into());
            e
        })
    }
}

impl<T> SessionErrorExt<T> for Result<T, ContainerError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SessionError> {
        self.map_err(|source| SessionError::Container { source, context: Some(context.into()) })
    }
}

impl From<ContainerError> for SessionError {
    #[inline]
    fn from(source: ContainerError) -> Self {
        Self::Container { source, context: None }
    }
}

impl From<&'static str> for SessionError {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self::Internal { message: Cow::Borrowed(s), context: None }
    }
}

impl From<String> for SessionError {
    #[inline]
    fn from(s: String) -> Self {
        Self::Internal { message: Cow::Owned(s), context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
