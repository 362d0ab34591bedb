use const_oid::ObjectIdentifier;
use const_oid::db::{DB, rfc5912, rfc8410};
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding, PrivateKeyInfo};
use der::Decode;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey, pkcs1::DecodeRsaPrivateKey};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{KeyEncodingError, ParseError};
use crate::jws::Algorithm;
use crate::pem_utils;

/// Public keys whose JWK representation and JWS verification are supported.
///
/// This is the trust anchor type for verification and the input type for
/// thumbprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    /// Extracts a public key from an X.509 `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    /// `KeyEncodingError::UnsupportedKeyType` for algorithms or curves without a
    /// supported JWK form, `KeyEncodingError::MalformedKey` if the key bits do
    /// not decode for the declared algorithm.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self, KeyEncodingError> {
        let raw = spki.subject_public_key.as_bytes().ok_or_else(|| {
            KeyEncodingError::MalformedKey("subject public key has unused bits".to_string())
        })?;
        let malformed = |e: &dyn std::fmt::Display| KeyEncodingError::MalformedKey(e.to_string());

        match spki.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => rsa_public_key_from_pkcs1(raw).map(PublicKey::Rsa),
            rfc5912::ID_EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .ok_or_else(|| {
                        KeyEncodingError::MalformedKey("EC key without curve parameters".to_string())
                    })?
                    .decode_as::<ObjectIdentifier>()
                    .map_err(|e| malformed(&e))?;
                match curve {
                    rfc5912::SECP_256_R_1 => p256::PublicKey::from_sec1_bytes(raw)
                        .map(PublicKey::EcdsaP256)
                        .map_err(|e| malformed(&e)),
                    rfc5912::SECP_384_R_1 => p384::PublicKey::from_sec1_bytes(raw)
                        .map(PublicKey::EcdsaP384)
                        .map_err(|e| malformed(&e)),
                    rfc5912::SECP_521_R_1 => p521::PublicKey::from_sec1_bytes(raw)
                        .map(PublicKey::EcdsaP521)
                        .map_err(|e| malformed(&e)),
                    other => Err(KeyEncodingError::UnsupportedKeyType(format!(
                        "EC curve {}",
                        oid_name(&other)
                    ))),
                }
            }
            rfc8410::ID_ED_25519 => {
                let bytes: &[u8; ed25519_dalek::PUBLIC_KEY_LENGTH] =
                    raw.try_into().map_err(|_| {
                        KeyEncodingError::MalformedKey(format!(
                            "Ed25519 public key must be {} bytes, got {}",
                            ed25519_dalek::PUBLIC_KEY_LENGTH,
                            raw.len()
                        ))
                    })?;
                Ed25519VerifyingKey::from_bytes(bytes)
                    .map(PublicKey::Ed25519)
                    .map_err(|e| malformed(&e))
            }
            other => Err(KeyEncodingError::UnsupportedKeyType(oid_name(&other))),
        }
    }

    /// Parses a PEM trust anchor.
    ///
    /// Accepts `PUBLIC KEY` (SPKI), `RSA PUBLIC KEY` (PKCS#1) and `CERTIFICATE`
    /// blocks; for a certificate the subject public key is used.
    pub fn from_pem(pem_str: &str) -> Result<Self, ParseError> {
        let block = pem_utils::parse_block(pem_str, pem_utils::PUBLIC_KEY_LABELS)?;
        let key = match block.tag() {
            pem_utils::RSA_PUBLIC_KEY => {
                rsa_public_key_from_pkcs1(block.contents()).map(PublicKey::Rsa)
            }
            pem_utils::CERTIFICATE => {
                let cert = crate::cert::Certificate::from_der(block.contents())?;
                cert.public_key()
            }
            _ => {
                let spki: SubjectPublicKeyInfoOwned = der::Decode::from_der(block.contents())?;
                PublicKey::from_spki(&spki)
            }
        };
        key.map_err(|e| ParseError::Der(e.to_string()))
    }

    /// Encodes the key as an SPKI `PUBLIC KEY` PEM document.
    pub fn to_pem(&self) -> Result<String, KeyEncodingError> {
        let pem = match self {
            PublicKey::Rsa(key) => key.to_public_key_pem(LineEnding::LF),
            PublicKey::EcdsaP256(key) => key.to_public_key_pem(LineEnding::LF),
            PublicKey::EcdsaP384(key) => key.to_public_key_pem(LineEnding::LF),
            PublicKey::EcdsaP521(key) => key.to_public_key_pem(LineEnding::LF),
            PublicKey::Ed25519(key) => key.to_public_key_pem(LineEnding::LF),
        };
        pem.map_err(|e| KeyEncodingError::MalformedKey(e.to_string()))
    }

    /// Short human readable key type, used in error messages.
    pub fn key_type(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "RSA",
            PublicKey::EcdsaP256(_) => "EC P-256",
            PublicKey::EcdsaP384(_) => "EC P-384",
            PublicKey::EcdsaP521(_) => "EC P-521",
            PublicKey::Ed25519(_) => "Ed25519",
        }
    }
}

/// Private keys able to sign a denylist.
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        secret: p256::SecretKey,
    },
    EcdsaP384 {
        secret: p384::SecretKey,
    },
    EcdsaP521 {
        secret: p521::SecretKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_type", &self.key_type())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = Ed25519SigningKey::generate(&mut rng);
        KeyPair::Ed25519 { signing_key }
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        KeyPair::EcdsaP256 {
            secret: p256::SecretKey::random(&mut rng),
        }
    }

    /// Parses a PEM private key: `PRIVATE KEY` (PKCS#8) or `RSA PRIVATE KEY` (PKCS#1).
    pub fn from_pem(pem_str: &str) -> Result<Self, ParseError> {
        let block = pem_utils::parse_block(pem_str, pem_utils::PRIVATE_KEY_LABELS)?;
        if block.tag() == pem_utils::RSA_PRIVATE_KEY {
            let private = RsaPrivateKey::from_pkcs1_der(block.contents())?;
            return Ok(KeyPair::from_rsa(private));
        }
        KeyPair::from_pkcs8_der(block.contents())
    }

    /// Parses a DER `PrivateKeyInfo`, selecting the key type from its algorithm
    /// identifier and, for EC keys, its named curve.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, ParseError> {
        let info = PrivateKeyInfo::try_from(der)?;
        let algorithm = info.algorithm.oid;
        match algorithm {
            rfc5912::RSA_ENCRYPTION => Ok(KeyPair::from_rsa(RsaPrivateKey::try_from(info)?)),
            rfc5912::ID_EC_PUBLIC_KEY => {
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .map_err(|e| ParseError::Der(e.to_string()))?;
                match curve {
                    rfc5912::SECP_256_R_1 => Ok(KeyPair::EcdsaP256 {
                        secret: p256::SecretKey::try_from(info)?,
                    }),
                    rfc5912::SECP_384_R_1 => Ok(KeyPair::EcdsaP384 {
                        secret: p384::SecretKey::try_from(info)?,
                    }),
                    rfc5912::SECP_521_R_1 => Ok(KeyPair::EcdsaP521 {
                        secret: p521::SecretKey::try_from(info)?,
                    }),
                    other => Err(ParseError::Der(format!(
                        "unsupported EC curve {}",
                        oid_name(&other)
                    ))),
                }
            }
            rfc8410::ID_ED_25519 => Ok(KeyPair::Ed25519 {
                signing_key: Ed25519SigningKey::try_from(info)?,
            }),
            other => Err(ParseError::Der(format!(
                "unsupported private key algorithm {}",
                oid_name(&other)
            ))),
        }
    }

    fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }

    /// Returns the public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { secret } => PublicKey::EcdsaP256(secret.public_key()),
            KeyPair::EcdsaP384 { secret } => PublicKey::EcdsaP384(secret.public_key()),
            KeyPair::EcdsaP521 { secret } => PublicKey::EcdsaP521(secret.public_key()),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// The JWS algorithm this key signs with unless told otherwise.
    pub fn default_algorithm(&self) -> Algorithm {
        match self {
            KeyPair::Rsa { .. } => Algorithm::RS256,
            KeyPair::EcdsaP256 { .. } => Algorithm::ES256,
            KeyPair::EcdsaP384 { .. } => Algorithm::ES384,
            KeyPair::EcdsaP521 { .. } => Algorithm::ES512,
            KeyPair::Ed25519 { .. } => Algorithm::EdDSA,
        }
    }

    /// Encodes the private key as a PKCS#8 `PRIVATE KEY` PEM document.
    pub fn to_pkcs8_pem(&self) -> Result<String, KeyEncodingError> {
        let pem = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_pem(LineEnding::LF),
            KeyPair::EcdsaP256 { secret } => secret.to_pkcs8_pem(LineEnding::LF),
            KeyPair::EcdsaP384 { secret } => secret.to_pkcs8_pem(LineEnding::LF),
            KeyPair::EcdsaP521 { secret } => secret.to_pkcs8_pem(LineEnding::LF),
            KeyPair::Ed25519 { signing_key } => signing_key.to_pkcs8_pem(LineEnding::LF),
        };
        pem.map(|doc| doc.as_str().to_owned())
            .map_err(|e| KeyEncodingError::MalformedKey(e.to_string()))
    }

    pub fn key_type(&self) -> &'static str {
        match self {
            KeyPair::Rsa { .. } => "RSA",
            KeyPair::EcdsaP256 { .. } => "EC P-256",
            KeyPair::EcdsaP384 { .. } => "EC P-384",
            KeyPair::EcdsaP521 { .. } => "EC P-521",
            KeyPair::Ed25519 { .. } => "Ed25519",
        }
    }
}

/// Largest RSA modulus accepted from certificates and trust anchors, in bits.
pub const MAX_RSA_MODULUS_BITS: usize = 16384;

// `RsaPublicKey::from_pkcs1_der` rejects moduli over 4096 bits.
fn rsa_public_key_from_pkcs1(der: &[u8]) -> Result<RsaPublicKey, KeyEncodingError> {
    let key = rsa::pkcs1::RsaPublicKey::from_der(der)
        .map_err(|e| KeyEncodingError::MalformedKey(e.to_string()))?;
    RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(key.modulus.as_bytes()),
        BigUint::from_bytes_be(key.public_exponent.as_bytes()),
        MAX_RSA_MODULUS_BITS,
    )
    .map_err(|e| KeyEncodingError::MalformedKey(e.to_string()))
}

/// Registered name of an OID, falling back to dotted notation.
fn oid_name(oid: &ObjectIdentifier) -> String {
    DB.by_oid(oid)
        .map(str::to_string)
        .unwrap_or_else(|| oid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_pem_round_trip() {
        let key_pair = KeyPair::generate_ecdsa_p256();
        let public = key_pair.public_key();
        let pem = public.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(PublicKey::from_pem(&pem).unwrap(), public);
    }

    #[test]
    fn test_private_key_pem_round_trip() {
        let key_pair = KeyPair::generate_ed25519();
        let pem = key_pair.to_pkcs8_pem().unwrap();
        let reparsed = KeyPair::from_pem(&pem).unwrap();
        assert_eq!(reparsed.public_key(), key_pair.public_key());
        assert_eq!(reparsed.default_algorithm(), Algorithm::EdDSA);
    }

    #[test]
    fn test_rsa_key_above_4096_bits() {
        use rsa::traits::PublicKeyParts;

        let pem = include_str!("../tests/fixtures/names/rsa8192.pem");
        match PublicKey::from_pem(pem).unwrap() {
            PublicKey::Rsa(key) => assert_eq!(key.n().bits(), 8192),
            other => panic!("unexpected key type {}", other.key_type()),
        }
    }

    #[test]
    fn test_private_key_rejects_public_label() {
        let pem = KeyPair::generate_ed25519()
            .public_key()
            .to_pem()
            .unwrap();
        assert!(matches!(
            KeyPair::from_pem(&pem),
            Err(ParseError::UnexpectedLabel { .. })
        ));
    }

    #[test]
    fn test_oid_name_falls_back_to_dotted() {
        assert_eq!(oid_name(&rfc8410::ID_ED_448), "id-Ed448");
        let unknown = ObjectIdentifier::new_unwrap("1.2.3.4.5");
        assert_eq!(oid_name(&unknown), "1.2.3.4.5");
    }
}
