//! use denylist::error::DenylistError;

use thiserror::Error;

use crate::membership::UncoveredCertificate;

/// Errors raised while rendering a public key as a JSON Web Key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyEncodingError {
    /// The key algorithm has no JWK representation supported by this crate.
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// The key material could not be decoded for its declared algorithm.
    #[error("Malformed key material: {0}")]
    MalformedKey(String),
}

/// Errors raised while decoding PEM, DER or JSON input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Error during PEM framing.
    #[error("Failed to decode PEM: {0}")]
    Pem(String),

    /// A PEM block carried a label other than the ones accepted.
    #[error("Unexpected PEM label {found:?}, expected one of {expected:?}")]
    UnexpectedLabel {
        found: String,
        expected: &'static [&'static str],
    },

    /// Error during DER decoding of a certificate or key.
    #[error("Failed to decode DER: {0}")]
    Der(String),

    /// Error during JSON (de)serialization of denylist entries.
    #[error("Failed to process JSON: {0}")]
    Json(String),

    /// Error reading input from the filesystem.
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// A file was read but its contents did not parse.
    #[error("Failed to parse {path}: {message}")]
    InFile { path: String, message: String },
}

/// A JWS algorithm name outside the supported set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unsupported JWS algorithm {0:?}, expected one of EdDSA, ES256, ES384, ES512, RS256, RS384, RS512")]
pub struct UnknownAlgorithm(pub String);

/// Errors raised while producing a signed denylist.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The private key could not be parsed or is of an unsupported type.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// The private key cannot produce signatures for the requested algorithm.
    #[error("Key type {key_type} cannot sign with algorithm {algorithm}")]
    KeyMismatch {
        key_type: &'static str,
        algorithm: &'static str,
    },

    /// The entries could not be serialized.
    #[error("Failed to serialize denylist: {0}")]
    Serialization(String),
}

/// Errors raised while authenticating a signed denylist.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The token is not three dot separated segments.
    #[error("Malformed compact JWS: {0}")]
    MalformedToken(String),

    /// A segment is not canonical unpadded base64url.
    #[error("Invalid base64url in {segment} segment: {message}")]
    Encoding {
        segment: &'static str,
        message: String,
    },

    /// The protected header is not a JSON object with a supported `alg`.
    #[error("Invalid JWS header: {0}")]
    Header(String),

    /// The header declares an algorithm other than the one expected.
    #[error("Algorithm mismatch: expected {expected}, token declares {found}")]
    AlgorithmMismatch { expected: &'static str, found: String },

    /// The trusted key cannot verify signatures for the expected algorithm.
    #[error("Key type {key_type} cannot verify algorithm {algorithm}")]
    KeyMismatch {
        key_type: &'static str,
        algorithm: &'static str,
    },

    /// The signature does not verify under the trusted key.
    #[error("Signature verification failed")]
    BadSignature,

    /// The authenticated payload is not a valid denylist.
    #[error("Invalid denylist payload: {0}")]
    Payload(String),
}

/// One or more certificates have no matching denylist entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("{} certificate(s) missing from the denylist", .0.len())]
    Uncovered(Vec<UncoveredCertificate>),
}

/// Umbrella error for callers mixing several denylist operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DenylistError {
    #[error(transparent)]
    KeyEncoding(#[from] KeyEncodingError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Membership(#[from] MembershipError),
}

impl From<der::Error> for ParseError {
    /// Converts a `der::Error` into a `ParseError`.
    fn from(err: der::Error) -> Self {
        ParseError::Der(err.to_string())
    }
}

impl From<pkcs8::Error> for ParseError {
    fn from(err: pkcs8::Error) -> Self {
        ParseError::Der(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for ParseError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        ParseError::Der(err.to_string())
    }
}

impl From<pem::PemError> for ParseError {
    fn from(err: pem::PemError) -> Self {
        ParseError::Pem(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Json(err.to_string())
    }
}

impl From<ParseError> for SigningError {
    fn from(err: ParseError) -> Self {
        SigningError::InvalidKey(err.to_string())
    }
}
