use crate::client::real_ip;
use crate::config::CsrfConfig;
use crate::error::{CsrfError, CsrfErrorExt};
use crate::target::{attach_token, canonical_subject, token};
use cachet_container::{Container, ContainerError, ContainerFactory, Nonce, Payload, PayloadKey, SharedRandom};
use chrono::{DateTime, Utc};
use http::{HeaderMap, Method, Uri};
use sha2::{Digest, Sha256};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Payload key of the source checksum.
pub const SOURCE_KEY: PayloadKey = 0x10;
/// Payload key of the subject checksum.
pub const SUBJECT_KEY: PayloadKey = 0x20;

/// `SHA-256(nonce || text)`.
#[must_use]
pub fn checksum(nonce: &[u8; 8], text: &str) -> Vec<u8> {
    Sha256::new().chain_update(nonce).chain_update(text.as_bytes()).finalize().to_vec()
}

/// Signs and validates anti-forgery tokens.
///
/// A token is a sealed container holding two checksums: one over the caller (`source`)
/// and one over the target (`subject`), both keyed by a random nonce stored in the
/// header. Tokens are stateless and stay valid for repeated use until the ttl runs out.
#[derive(Debug, Clone)]
pub struct Csrf {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    factory: ContainerFactory,
    rand: SharedRandom,
    ttl: Duration,
    parameter: String,
    methods: Vec<Method>,
}

impl Csrf {
    /// # Errors
    /// Returns [`CsrfError::Configuration`] or [`CsrfError::Container`] for unusable settings
    /// or key material.
    pub fn new(config: &CsrfConfig, rand: SharedRandom) -> Result<Self, CsrfError> {
        config.validate()?;
        let factory = ContainerFactory::new(config.settings()?, Arc::clone(&rand))?;

        info!(
            ttl_secs = config.ttl.as_secs(),
            parameter = %config.parameter_name,
            "CSRF protection initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                factory,
                rand,
                ttl: config.ttl,
                parameter: config.parameter_name.trim().to_owned(),
                methods: config.methods()?,
            }),
        })
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    #[must_use]
    pub fn parameter_name(&self) -> &str {
        &self.inner.parameter
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.inner.methods
    }

    /// Whether requests with `method` must carry a token.
    #[must_use]
    pub fn protects(&self, method: &Method) -> bool {
        self.inner.methods.contains(method)
    }

    /// # Errors
    /// See [`Csrf::sign_at`].
    pub fn sign(&self, source: &str, subject: &str) -> Result<String, CsrfError> {
        self.sign_at(source, subject, Utc::now())
    }

    /// A token for `source` and `subject`, valid from `now` for the configured ttl.
    ///
    /// # Errors
    /// Returns [`CsrfError::Container`] if the random source or the sealer fails.
    pub fn sign_at(&self, source: &str, subject: &str, now: DateTime<Utc>) -> Result<String, CsrfError> {
        let mut raw = [0u8; 8];
        self.inner.rand.fill(&mut raw)?;
        // zero would make touch increment instead of set
        let nonce: Nonce = u64::from_be_bytes(raw).max(1);
        let bytes = nonce.to_be_bytes();

        let mut payload = Payload::new();
        payload.insert(SOURCE_KEY, checksum(&bytes, source));
        payload.insert(SUBJECT_KEY, checksum(&bytes, subject));

        let container = self.inner.factory.create(now, self.inner.ttl, payload)?;
        container.touch(nonce);
        let token = container.save()?;

        String::from_utf8(token).map_err(|_| CsrfError::Internal {
            message: "sealed token is not text".into(),
            context: None,
        })
    }

    /// Decodes `token` without checking its window or checksums.
    ///
    /// # Errors
    /// Returns [`CsrfError::Container`] with a format or decrypt error for unreadable tokens.
    pub fn unpack(&self, token: &str) -> Result<Box<dyn Container>, CsrfError> {
        let container = self.inner.factory.create(Utc::now(), self.inner.ttl, Payload::new())?;
        container.load(token.trim().as_bytes()).context("unpack")?;
        Ok(container)
    }

    /// # Errors
    /// See [`Csrf::validate_at`].
    pub fn validate(&self, source: &str, subject: &str, token: &str) -> Result<(), CsrfError> {
        self.validate_at(source, subject, token, Utc::now())
    }

    /// Checks that `token` is intact, inside its window at `now`, and was issued for
    /// exactly `source` and `subject`.
    ///
    /// # Errors
    /// * [`CsrfError::Container`] for unreadable, expired or incompatible tokens.
    /// * [`CsrfError::SourceMismatch`] or [`CsrfError::SubjectMismatch`] naming the failed
    ///   checksum.
    pub fn validate_at(
        &self,
        source: &str,
        subject: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CsrfError> {
        let container = self.unpack(token)?;
        container.validate_at(now)?;

        let nonce = container.header().nonce.to_be_bytes();
        let stored_source = container.get(SOURCE_KEY).unwrap_or_default();
        let stored_subject = container.get(SUBJECT_KEY).unwrap_or_default();

        let expected = checksum(&nonce, source);
        if stored_source != expected {
            return Err(CsrfError::SourceMismatch {
                message: format!(
                    "token checksum {} does not match {} for {source:?}",
                    hex::encode(&stored_source),
                    hex::encode(&expected)
                )
                .into(),
                context: None,
            });
        }

        let expected = checksum(&nonce, subject);
        if stored_subject != expected {
            return Err(CsrfError::SubjectMismatch {
                message: format!(
                    "token checksum {} does not match {} for {subject:?}",
                    hex::encode(&stored_subject),
                    hex::encode(&expected)
                )
                .into(),
                context: None,
            });
        }
        Ok(())
    }

    /// `uri` with a token for its canonical path and query attached.
    ///
    /// # Errors
    /// Returns [`CsrfError::Url`] if the signed URI cannot be rebuilt.
    pub fn sign_url(&self, source: &str, uri: &Uri) -> Result<Uri, CsrfError> {
        self.sign_url_at(source, uri, Utc::now())
    }

    /// # Errors
    /// See [`Csrf::sign_url`].
    pub fn sign_url_at(&self, source: &str, uri: &Uri, now: DateTime<Utc>) -> Result<Uri, CsrfError> {
        let subject = canonical_subject(uri, &self.inner.parameter);
        let token = self.sign_at(source, &subject, now)?;
        attach_token(uri, &self.inner.parameter, &token)
    }

    /// # Errors
    /// Returns [`CsrfError::Url`] if `uri` does not parse.
    pub fn sign_url_str(&self, source: &str, uri: &str) -> Result<String, CsrfError> {
        let uri: Uri = uri.parse()?;
        Ok(self.sign_url(source, &uri)?.to_string())
    }

    /// # Errors
    /// See [`Csrf::validate_url_at`].
    pub fn validate_url(&self, source: &str, uri: &Uri) -> Result<(), CsrfError> {
        self.validate_url_at(source, uri, Utc::now())
    }

    /// Extracts the token parameter and validates it against the rest of `uri`.
    ///
    /// # Errors
    /// A missing token is a format error; otherwise see [`Csrf::validate_at`].
    pub fn validate_url_at(&self, source: &str, uri: &Uri, now: DateTime<Utc>) -> Result<(), CsrfError> {
        let Some(token) = token(uri, &self.inner.parameter) else {
            return Err(CsrfError::Container {
                source: ContainerError::Format {
                    message: format!("missing {:?} parameter", self.inner.parameter).into(),
                    context: None,
                },
                context: None,
            });
        };
        self.validate_at(source, &canonical_subject(uri, &self.inner.parameter), &token, now)
    }

    /// Validates a request: the source is the real client address, the subject `uri`.
    ///
    /// Pass the URI the client actually requested; routers that strip a mount prefix
    /// would otherwise change the subject.
    ///
    /// # Errors
    /// [`CsrfError::MissingSource`] when neither the headers nor `peer` name the client,
    /// otherwise see [`Csrf::validate_url`].
    pub fn validate_request(&self, headers: &HeaderMap, uri: &Uri, peer: Option<IpAddr>) -> Result<(), CsrfError> {
        let Some(source) = real_ip(headers, peer) else {
            return Err(CsrfError::MissingSource {
                message: "no forwarding header and no peer address".into(),
                context: None,
            });
        };
        self.validate_url(&source.to_string(), uri)
    }
}
