use crate::error::ContainerError;
use crate::jwt::Claims;
use crate::kinds::SignatureAlgorithm;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use std::fmt;

/// A signer/verifier pair for one algorithm and key.
///
/// Asymmetric algorithms take a PKCS#8 PEM private key; the verifying half is derived
/// from it. ES512 is not covered by `jsonwebtoken`, so it runs a small JWS implementation
/// over `p521`.
pub struct Signer {
    algorithm: SignatureAlgorithm,
    backend: Backend,
}

enum Backend {
    Jws {
        algorithm: Algorithm,
        encoding: EncodingKey,
        decoding: DecodingKey,
        validation: Box<Validation>,
    },
    Es512 { signing: p521::ecdsa::SigningKey, verifying: p521::ecdsa::VerifyingKey },
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("algorithm", &self.algorithm).finish_non_exhaustive()
    }
}

impl Signer {
    /// Parses `key` for `algorithm`.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if the key does not suit the algorithm.
    pub fn new(algorithm: SignatureAlgorithm, key: &[u8]) -> Result<Self, ContainerError> {
        let backend = match jws_algorithm(algorithm) {
            Some(jws) => {
                let (encoding, decoding) = key_pair(algorithm, key).map_err(|e| {
                    ContainerError::Configuration {
                        message: e.message,
                        context: Some(format!("{algorithm} key").into()),
                    }
                })?;
                let mut validation = Validation::new(jws);
                validation.validate_exp = false;
                validation.validate_nbf = false;
                validation.validate_aud = false;
                validation.required_spec_claims.clear();
                validation.leeway = 0;
                Backend::Jws {
                    algorithm: jws,
                    encoding,
                    decoding,
                    validation: Box::new(validation),
                }
            },
            None => es512_pair(key)?,
        };
        Ok(Self { algorithm, backend })
    }

    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, ContainerError> {
        match &self.backend {
            Backend::Jws { algorithm, encoding, .. } => {
                jsonwebtoken::encode(&Header::new(*algorithm), claims, encoding).map_err(|e| {
                    ContainerError::Internal {
                        message: e.to_string().into(),
                        context: Some("JWT signing failed".into()),
                    }
                })
            },
            Backend::Es512 { signing, .. } => es512_sign(signing, claims),
        }
    }

    pub(crate) fn verify(&self, token: &str) -> Result<Claims, ContainerError> {
        match &self.backend {
            Backend::Jws { decoding, validation, .. } => {
                jsonwebtoken::decode::<Claims>(token, decoding, validation)
                    .map(|data| data.claims)
                    .map_err(classify)
            },
            Backend::Es512 { verifying, .. } => es512_verify(verifying, token),
        }
    }
}

const fn jws_algorithm(algorithm: SignatureAlgorithm) -> Option<Algorithm> {
    use SignatureAlgorithm as S;
    Some(match algorithm {
        S::Hs256 => Algorithm::HS256,
        S::Hs384 => Algorithm::HS384,
        S::Hs512 => Algorithm::HS512,
        S::Rs256 => Algorithm::RS256,
        S::Rs384 => Algorithm::RS384,
        S::Rs512 => Algorithm::RS512,
        S::Ps256 => Algorithm::PS256,
        S::Ps384 => Algorithm::PS384,
        S::Ps512 => Algorithm::PS512,
        S::Es256 => Algorithm::ES256,
        S::Es384 => Algorithm::ES384,
        S::EdDsa => Algorithm::EdDSA,
        S::Es512 => return None,
    })
}

/// Signature mismatch is a decryption-class failure; anything about token shape is a
/// format failure.
fn classify(err: JwtError) -> ContainerError {
    let message = err.to_string();
    match err.kind() {
        ErrorKind::InvalidSignature => ContainerError::Decrypt {
            message: message.into(),
            context: Some("JWT signature mismatch".into()),
        },
        ErrorKind::InvalidToken
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingAlgorithm
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => {
            ContainerError::Format { message: message.into(), context: Some("JWT".into()) }
        },
        _ => ContainerError::Internal { message: message.into(), context: Some("JWT".into()) },
    }
}

struct KeyError {
    message: std::borrow::Cow<'static, str>,
}

impl<E: fmt::Display> From<E> for KeyError {
    fn from(e: E) -> Self {
        Self { message: e.to_string().into() }
    }
}

fn pem(key: &[u8]) -> Result<&str, KeyError> {
    std::str::from_utf8(key).map_err(|_| KeyError { message: "PEM key is not valid UTF-8".into() })
}

fn b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn key_pair(
    algorithm: SignatureAlgorithm,
    key: &[u8],
) -> Result<(EncodingKey, DecodingKey), KeyError> {
    use SignatureAlgorithm as S;
    match algorithm {
        S::Hs256 | S::Hs384 | S::Hs512 => {
            Ok((EncodingKey::from_secret(key), DecodingKey::from_secret(key)))
        },
        S::Rs256 | S::Rs384 | S::Rs512 | S::Ps256 | S::Ps384 | S::Ps512 => {
            use rsa::pkcs1::DecodeRsaPrivateKey;
            use rsa::pkcs8::DecodePrivateKey;
            use rsa::traits::PublicKeyParts;

            let text = pem(key)?;
            let private = rsa::RsaPrivateKey::from_pkcs8_pem(text)
                .or_else(|_| rsa::RsaPrivateKey::from_pkcs1_pem(text))?;
            let n = b64(&private.n().to_bytes_be());
            let e = b64(&private.e().to_bytes_be());
            Ok((EncodingKey::from_rsa_pem(key)?, DecodingKey::from_rsa_components(&n, &e)?))
        },
        S::Es256 => {
            use p256::elliptic_curve::sec1::ToEncodedPoint;
            use p256::pkcs8::DecodePrivateKey;

            let secret = p256::SecretKey::from_pkcs8_pem(pem(key)?)?;
            let point = secret.public_key().to_encoded_point(false);
            let (x, y) = point.x().zip(point.y()).ok_or("EC public key is the identity")?;
            Ok((EncodingKey::from_ec_pem(key)?, DecodingKey::from_ec_components(&b64(x), &b64(y))?))
        },
        S::Es384 => {
            use p384::elliptic_curve::sec1::ToEncodedPoint;
            use p384::pkcs8::DecodePrivateKey;

            let secret = p384::SecretKey::from_pkcs8_pem(pem(key)?)?;
            let point = secret.public_key().to_encoded_point(false);
            let (x, y) = point.x().zip(point.y()).ok_or("EC public key is the identity")?;
            Ok((EncodingKey::from_ec_pem(key)?, DecodingKey::from_ec_components(&b64(x), &b64(y))?))
        },
        S::EdDsa => {
            use ed25519_dalek::pkcs8::DecodePrivateKey;

            let signing = ed25519_dalek::SigningKey::from_pkcs8_pem(pem(key)?)?;
            let x = b64(signing.verifying_key().as_bytes());
            Ok((EncodingKey::from_ed_pem(key)?, DecodingKey::from_ed_components(&x)?))
        },
        S::Es512 => Err(KeyError { message: "ES512 is not a jsonwebtoken algorithm".into() }),
    }
}

// --- ES512 ---

const ES512_HEADER: &str = r#"{"typ":"JWT","alg":"ES512"}"#;

#[derive(Deserialize)]
struct JoseHeader {
    alg: String,
}

fn es512_pair(key: &[u8]) -> Result<Backend, ContainerError> {
    es512_keys(key).map_err(|e| ContainerError::Configuration {
        message: e.message,
        context: Some("ES512 key".into()),
    })
}

fn es512_keys(key: &[u8]) -> Result<Backend, KeyError> {
    use p521::elliptic_curve::sec1::ToEncodedPoint;
    use p521::pkcs8::DecodePrivateKey;

    let secret = p521::SecretKey::from_pkcs8_pem(pem(key)?)?;
    let signing = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())?;
    let point = secret.public_key().to_encoded_point(false);
    let verifying = p521::ecdsa::VerifyingKey::from_sec1_bytes(point.as_bytes())?;
    Ok(Backend::Es512 { signing, verifying })
}

fn es512_sign(signing: &p521::ecdsa::SigningKey, claims: &Claims) -> Result<String, ContainerError> {
    use p521::ecdsa::signature::Signer as _;

    let body = serde_json::to_vec(claims).map_err(|e| ContainerError::Internal {
        message: e.to_string().into(),
        context: Some("JWT claims encoding failed".into()),
    })?;
    let input = format!("{}.{}", b64(ES512_HEADER.as_bytes()), b64(&body));
    let signature: p521::ecdsa::Signature =
        signing.try_sign(input.as_bytes()).map_err(|e| ContainerError::Internal {
            message: e.to_string().into(),
            context: Some("ES512 signing failed".into()),
        })?;

    Ok(format!("{input}.{}", b64(&signature.to_bytes())))
}

fn es512_verify(
    verifying: &p521::ecdsa::VerifyingKey,
    token: &str,
) -> Result<Claims, ContainerError> {
    use p521::ecdsa::signature::Verifier as _;

    let mut parts = token.split('.');
    let (Some(header), Some(body), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ContainerError::format("JWT must have three segments"));
    };

    let decode = |segment: &str| {
        URL_SAFE_NO_PAD.decode(segment).map_err(|e| ContainerError::Format {
            message: e.to_string().into(),
            context: Some("JWT".into()),
        })
    };
    let json = |e: serde_json::Error| ContainerError::Format {
        message: e.to_string().into(),
        context: Some("JWT".into()),
    };

    let jose: JoseHeader = serde_json::from_slice(&decode(header)?).map_err(json)?;
    if jose.alg != "ES512" {
        return Err(ContainerError::Format {
            message: format!("unexpected algorithm {:?}, expected \"ES512\"", jose.alg).into(),
            context: Some("JWT".into()),
        });
    }

    let mismatch = || ContainerError::Decrypt {
        message: "signature verification failed".into(),
        context: Some("JWT signature mismatch".into()),
    };
    // Out-of-range scalars are forged signatures, not malformed tokens.
    let signature =
        p521::ecdsa::Signature::from_slice(&decode(signature)?).map_err(|_| mismatch())?;
    let input_len = header.len() + 1 + body.len();
    verifying.verify(&token.as_bytes()[..input_len], &signature).map_err(|_| mismatch())?;

    serde_json::from_slice(&decode(body)?).map_err(json)
}
