//! Compact JWS signing and verification of denylists.
//!
//! A signed denylist is `BASE64URL(header) "." BASE64URL(payload) "."
//! BASE64URL(signature)` where the header is `{"alg":"<alg>"}`, the payload is
//! the compact JSON of the entries and the signature covers the first two
//! segments joined by the dot.
//!
//! Verification is fail-closed: the header algorithm must equal the expected
//! algorithm exactly, and the payload is only decoded and parsed after the
//! signature has been checked against the trusted key.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use const_oid::AssociatedOid;
use ecdsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::entry::Denylist;
use crate::error::{SigningError, UnknownAlgorithm, VerificationError};
use crate::key::{KeyPair, PublicKey};

/// JWS signature algorithms (RFC 7518 / RFC 8037 names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Ed25519.
    #[default]
    EdDSA,
    /// ECDSA P-256 with SHA-256.
    ES256,
    /// ECDSA P-384 with SHA-384.
    ES384,
    /// ECDSA P-521 with SHA-512.
    ES512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    RS512,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::EdDSA,
        Algorithm::ES256,
        Algorithm::ES384,
        Algorithm::ES512,
        Algorithm::RS256,
        Algorithm::RS384,
        Algorithm::RS512,
    ];

    /// The `alg` header value.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::EdDSA => "EdDSA",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            Algorithm::ES512 => "ES512",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// JOSE protected header.
#[derive(Debug, Serialize)]
struct Header {
    alg: &'static str,
}

/// A denylist in compact JWS serialization.
///
/// Holding a `SignedDenylist` says nothing about its authenticity; the entries
/// are only reachable through [`SignedDenylist::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDenylist {
    token: String,
}

impl SignedDenylist {
    /// Wraps a token received from elsewhere, for example read from disk.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn into_string(self) -> String {
        self.token
    }

    /// Authenticates the token and returns its entries. See [`verify`].
    pub fn verify(
        &self,
        trusted_key: &PublicKey,
        expected: Algorithm,
    ) -> Result<Denylist, VerificationError> {
        verify(&self.token, trusted_key, expected)
    }
}

impl fmt::Display for SignedDenylist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Signs `denylist` with `key` under `algorithm`.
///
/// # Errors
/// `SigningError::KeyMismatch` if the key type cannot produce `algorithm`
/// signatures, `SigningError::Serialization` if the entries fail to encode.
pub fn sign(
    denylist: &Denylist,
    key: &KeyPair,
    algorithm: Algorithm,
) -> Result<SignedDenylist, SigningError> {
    let payload = denylist
        .to_json()
        .map_err(|e| SigningError::Serialization(e.to_string()))?;
    let header = Header {
        alg: algorithm.name(),
    };
    let header =
        serde_json::to_vec(&header).map_err(|e| SigningError::Serialization(e.to_string()))?;

    let signing_input = format!("{}.{}", b64(&header), b64(&payload));
    let signature = create_signature(signing_input.as_bytes(), key, algorithm)?;

    tracing::debug!(
        %algorithm,
        key_type = key.key_type(),
        entries = denylist.len(),
        "signed denylist"
    );
    Ok(SignedDenylist {
        token: format!("{signing_input}.{}", b64(&signature)),
    })
}

/// Authenticates a compact JWS with `trusted_key` and returns the entries.
///
/// # Errors
/// Any malformed segment, a header algorithm other than `expected`, a key that
/// cannot verify `expected`, or a signature mismatch yields
/// `VerificationError`; in every case the payload is discarded unparsed.
pub fn verify(
    token: &str,
    trusted_key: &PublicKey,
    expected: Algorithm,
) -> Result<Denylist, VerificationError> {
    let payload = verify_payload(token, trusted_key, expected)?;
    Denylist::from_json(&payload).map_err(|e| VerificationError::Payload(e.to_string()))
}

/// Checks the token and returns the raw authenticated payload bytes.
pub fn verify_payload(
    token: &str,
    trusted_key: &PublicKey,
    expected: Algorithm,
) -> Result<Vec<u8>, VerificationError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments[..] else {
        return Err(VerificationError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let header: Map<String, Value> =
        serde_json::from_slice(&decode_segment("header", header_b64)?)
            .map_err(|e| VerificationError::Header(e.to_string()))?;
    // Presence is enough; `"crit":null` is rejected too.
    if header.contains_key("crit") {
        return Err(VerificationError::Header(
            "critical header parameters are not supported".to_string(),
        ));
    }
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| VerificationError::Header("missing string \"alg\" member".to_string()))?;
    if alg != expected.name() {
        return Err(VerificationError::AlgorithmMismatch {
            expected: expected.name(),
            found: alg.to_string(),
        });
    }

    let signature = decode_segment("signature", signature_b64)?;
    let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
    check_signature(signing_input.as_bytes(), &signature, trusted_key, expected)?;
    tracing::debug!(algorithm = %expected, key_type = trusted_key.key_type(), "signature verified");

    decode_segment("payload", payload_b64)
}

fn create_signature(
    data: &[u8],
    key: &KeyPair,
    algorithm: Algorithm,
) -> Result<Vec<u8>, SigningError> {
    match (key, algorithm) {
        (KeyPair::Ed25519 { signing_key }, Algorithm::EdDSA) => {
            Ok(signing_key.sign(data).to_bytes().to_vec())
        }
        (KeyPair::EcdsaP256 { secret }, Algorithm::ES256) => {
            let signature: p256::ecdsa::Signature =
                p256::ecdsa::SigningKey::from(secret).sign(data);
            Ok(signature.to_bytes().to_vec())
        }
        (KeyPair::EcdsaP384 { secret }, Algorithm::ES384) => {
            let signature: p384::ecdsa::Signature =
                p384::ecdsa::SigningKey::from(secret).sign(data);
            Ok(signature.to_bytes().to_vec())
        }
        (KeyPair::EcdsaP521 { secret }, Algorithm::ES512) => {
            let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
                .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
            let signature: p521::ecdsa::Signature = signing_key.sign(data);
            Ok(signature.to_bytes().to_vec())
        }
        (KeyPair::Rsa { private, .. }, Algorithm::RS256) => Ok(rsa_sign::<Sha256>(private, data)),
        (KeyPair::Rsa { private, .. }, Algorithm::RS384) => Ok(rsa_sign::<Sha384>(private, data)),
        (KeyPair::Rsa { private, .. }, Algorithm::RS512) => Ok(rsa_sign::<Sha512>(private, data)),
        (key, algorithm) => Err(SigningError::KeyMismatch {
            key_type: key.key_type(),
            algorithm: algorithm.name(),
        }),
    }
}

fn rsa_sign<D>(private: &RsaPrivateKey, data: &[u8]) -> Vec<u8>
where
    D: Digest + AssociatedOid,
{
    let signing_key = rsa::pkcs1v15::SigningKey::<D>::new(private.clone());
    signing_key.sign(data).to_vec()
}

fn check_signature(
    data: &[u8],
    signature: &[u8],
    key: &PublicKey,
    algorithm: Algorithm,
) -> Result<(), VerificationError> {
    match (key, algorithm) {
        (PublicKey::Ed25519(verifying_key), Algorithm::EdDSA) => {
            let signature = ed25519_dalek::Signature::from_slice(signature).map_err(bad_signature)?;
            verifying_key.verify_strict(data, &signature).map_err(bad_signature)
        }
        (PublicKey::EcdsaP256(public), Algorithm::ES256) => {
            let signature = p256::ecdsa::Signature::from_slice(signature).map_err(bad_signature)?;
            p256::ecdsa::VerifyingKey::from(public)
                .verify(data, &signature)
                .map_err(bad_signature)
        }
        (PublicKey::EcdsaP384(public), Algorithm::ES384) => {
            let signature = p384::ecdsa::Signature::from_slice(signature).map_err(bad_signature)?;
            p384::ecdsa::VerifyingKey::from(public)
                .verify(data, &signature)
                .map_err(bad_signature)
        }
        (PublicKey::EcdsaP521(public), Algorithm::ES512) => {
            let signature = p521::ecdsa::Signature::from_slice(signature).map_err(bad_signature)?;
            p521::ecdsa::VerifyingKey::from_affine(*public.as_affine())
                .map_err(bad_signature)?
                .verify(data, &signature)
                .map_err(bad_signature)
        }
        (PublicKey::Rsa(public), Algorithm::RS256) => rsa_verify::<Sha256>(public, data, signature),
        (PublicKey::Rsa(public), Algorithm::RS384) => rsa_verify::<Sha384>(public, data, signature),
        (PublicKey::Rsa(public), Algorithm::RS512) => rsa_verify::<Sha512>(public, data, signature),
        (key, algorithm) => Err(VerificationError::KeyMismatch {
            key_type: key.key_type(),
            algorithm: algorithm.name(),
        }),
    }
}

fn rsa_verify<D>(
    public: &RsaPublicKey,
    data: &[u8],
    signature: &[u8],
) -> Result<(), VerificationError>
where
    D: Digest + AssociatedOid,
{
    let signature = rsa::pkcs1v15::Signature::try_from(signature).map_err(bad_signature)?;
    rsa::pkcs1v15::VerifyingKey::<D>::new(public.clone())
        .verify(data, &signature)
        .map_err(bad_signature)
}

fn bad_signature<E>(_: E) -> VerificationError {
    VerificationError::BadSignature
}

fn b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_segment(segment: &'static str, value: &str) -> Result<Vec<u8>, VerificationError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| VerificationError::Encoding {
            segment,
            message: e.to_string(),
        })
}
