use crate::config::SessionConfig;
use crate::error::SessionError;
use cachet_container::{
    Container, ContainerFactory, Data, Header, Nonce, Payload, PayloadKey, SharedRandom, window_end,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Extra check run after the container window and version passed.
pub type Validator = Arc<dyn Fn(&Session) -> Result<(), SessionError> + Send + Sync>;

/// Applied to every session a [`Sessions`] handle creates, in registration order.
#[derive(Clone)]
pub struct SessionOption(Arc<dyn Fn(&mut Session) -> Result<(), SessionError> + Send + Sync>);

impl fmt::Debug for SessionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionOption(..)")
    }
}

/// Seeds every new session with `key = value`.
#[must_use]
pub fn with_payload(key: PayloadKey, value: impl Into<Vec<u8>>) -> SessionOption {
    let value = value.into();
    SessionOption(Arc::new(move |session: &mut Session| session.set(key, value.clone())))
}

/// Registers a validator on every new session.
#[must_use]
pub fn with_validator<F>(validate: F) -> SessionOption
where
    F: Fn(&Session) -> Result<(), SessionError> + Send + Sync + 'static,
{
    let validate: Validator = Arc::new(validate);
    SessionOption(Arc::new(move |session: &mut Session| {
        session.validators.push(Arc::clone(&validate));
        Ok(())
    }))
}

/// Creates sessions sharing one container factory, lifetime policy and option list.
///
/// Cheap to clone; meant to live in application state.
#[derive(Debug, Clone)]
pub struct Sessions {
    factory: ContainerFactory,
    max_age: Duration,
    refresh: Duration,
    options: Arc<[SessionOption]>,
}

impl Sessions {
    /// # Errors
    /// Returns [`SessionError::Configuration`] for zero durations.
    pub fn new(factory: ContainerFactory, max_age: Duration, refresh: Duration) -> Result<Self, SessionError> {
        if max_age.is_zero() || refresh.is_zero() {
            return Err(SessionError::Configuration {
                message: "max-age and refresh must be greater than zero".into(),
                context: None,
            });
        }
        Ok(Self { factory, max_age, refresh, options: Arc::from([]) })
    }

    /// Validates `config` and builds its container factory.
    ///
    /// # Errors
    /// Propagates configuration and key loading failures.
    pub fn from_config(config: &SessionConfig, rand: SharedRandom) -> Result<Self, SessionError> {
        config.validate()?;
        let factory = ContainerFactory::from_config(&config.container, rand)?;
        Self::new(factory, config.max_age, config.refresh)
    }

    /// Adds `options` after the ones already registered.
    #[must_use]
    pub fn with_options(mut self, options: impl IntoIterator<Item = SessionOption>) -> Self {
        self.options = self.options.iter().cloned().chain(options).collect();
        self
    }

    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    #[must_use]
    pub const fn factory(&self) -> &ContainerFactory {
        &self.factory
    }

    /// A fresh, empty session valid from now for `max-age`.
    ///
    /// # Errors
    /// Propagates container creation and option failures.
    pub fn create(&self) -> Result<Session, SessionError> {
        self.create_at(Utc::now())
    }

    /// A fresh, empty session valid from `now` for `max-age`.
    ///
    /// # Errors
    /// Propagates container creation and option failures.
    pub fn create_at(&self, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let container = self.factory.create(now, self.max_age, Payload::new())?;
        let mut session = Session { sessions: self.clone(), container, validators: Vec::new() };
        for option in self.options.iter() {
            (option.0)(&mut session)?;
        }
        Ok(session)
    }
}

/// A container plus refresh policy and validators.
///
/// Reads and writes go through the container lock, so a session can be shared behind an
/// [`Arc`] between the middleware and the handler.
pub struct Session {
    sessions: Sessions,
    container: Box<dyn Container>,
    validators: Vec<Validator>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("header", &self.container.header())
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn header(&self) -> Header {
        self.container.header()
    }

    #[must_use]
    pub fn payload(&self) -> Payload {
        self.container.payload()
    }

    #[must_use]
    pub fn data(&self) -> Data {
        self.container.data()
    }

    #[must_use]
    pub fn container(&self) -> &dyn Container {
        self.container.as_ref()
    }

    pub fn clean(&self) {
        self.container.clean();
    }

    /// Advances the nonce so the session is saved after the request.
    pub fn touch(&self) {
        self.container.touch(0);
    }

    /// # Errors
    /// The container window or version failure, or the first validator rejection.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.validate_at(Utc::now())
    }

    /// # Errors
    /// See [`Session::validate`].
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.container.validate_at(now)?;
        self.validators.iter().try_for_each(|validate| validate(self))
    }

    #[must_use]
    pub fn refresh_required(&self) -> bool {
        self.refresh_required_at(Utc::now())
    }

    /// `true` once `now` is past `valid_after + refresh`.
    #[must_use]
    pub fn refresh_required_at(&self, now: DateTime<Utc>) -> bool {
        window_end(self.header().valid_after, self.sessions.refresh).is_ok_and(|due| now > due)
    }

    /// # Errors
    /// Returns [`SessionError::Container`] if `max-age` overflows the calendar.
    pub fn refresh(&self) -> Result<(), SessionError> {
        self.refresh_at(Utc::now())
    }

    /// Moves the window to `now .. now + max-age` and advances the nonce.
    ///
    /// # Errors
    /// See [`Session::refresh`].
    pub fn refresh_at(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let valid_before = window_end(now, self.sessions.max_age)?;
        self.container.refresh(now, valid_before);
        debug!(valid_after = %now, valid_before = %valid_before, "Session refreshed");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: PayloadKey) -> Option<Vec<u8>> {
        self.container.get(key)
    }

    /// The value at `key` as text; invalid UTF-8 is replaced.
    #[must_use]
    pub fn get_string(&self, key: PayloadKey) -> Option<String> {
        self.container.get(key).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Stores `value` and refreshes the session.
    ///
    /// # Errors
    /// See [`Session::refresh`].
    pub fn set(&self, key: PayloadKey, value: impl Into<Vec<u8>>) -> Result<(), SessionError> {
        self.container.set(key, value.into());
        self.refresh()
    }

    /// # Errors
    /// See [`Session::refresh`].
    pub fn set_string(&self, key: PayloadKey, value: impl Into<String>) -> Result<(), SessionError> {
        self.set(key, value.into().into_bytes())
    }

    /// Removes `key`; refreshes only when it was present.
    ///
    /// # Errors
    /// See [`Session::refresh`].
    pub fn del(&self, key: PayloadKey) -> Result<bool, SessionError> {
        let found = self.container.del(key);
        if found {
            self.refresh()?;
        }
        Ok(found)
    }

    /// # Errors
    /// Propagates container encoding failures.
    pub fn save(&self) -> Result<Vec<u8>, SessionError> {
        Ok(self.container.save()?)
    }

    /// # Errors
    /// Propagates container decoding failures; the session is unchanged on error.
    pub fn load(&self, bytes: &[u8]) -> Result<(), SessionError> {
        Ok(self.container.load(bytes)?)
    }

    #[must_use]
    pub fn nonce(&self) -> Nonce {
        self.header().nonce
    }

    /// A brand-new empty session with the same configuration and options.
    ///
    /// # Errors
    /// See [`Sessions::create`].
    pub fn renew(&self) -> Result<Self, SessionError> {
        self.sessions.create()
    }

    #[must_use]
    pub const fn sessions(&self) -> &Sessions {
        &self.sessions
    }
}
