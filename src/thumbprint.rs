//! JSON Web Key thumbprints per [RFC 7638](https://www.rfc-editor.org/rfc/rfc7638).
//!
//! A thumbprint is the base64url (unpadded) SHA-256 digest of the key's
//! required JWK members, serialized as a JSON object with the members in
//! lexicographic order and no whitespace:
//!
//! | Key type | Members                    |
//! |----------|----------------------------|
//! | RSA      | `e`, `kty`, `n`            |
//! | EC       | `crv`, `kty`, `x`, `y`     |
//! | Ed25519  | `crv`, `kty`, `x` (`OKP`)  |
//!
//! Optional members such as `kid` or `alg` never influence the result.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::traits::PublicKeyParts;
use sha2::{Digest, Sha256};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::KeyEncodingError;
use crate::key::PublicKey;

/// The required JWK members of a key, ordered by member name.
pub type JwkMembers = BTreeMap<&'static str, String>;

/// Builds the RFC 7638 required member set for `key`.
pub fn required_members(key: &PublicKey) -> Result<JwkMembers, KeyEncodingError> {
    let mut members = JwkMembers::new();
    match key {
        PublicKey::Rsa(rsa) => {
            members.insert("kty", "RSA".to_string());
            members.insert("n", b64(&rsa.n().to_bytes_be()));
            members.insert("e", b64(&rsa.e().to_bytes_be()));
        }
        PublicKey::EcdsaP256(ec) => {
            let point = ec.to_encoded_point(false);
            let (x, y) = (point.x().map(|x| x.as_slice()), point.y().map(|y| y.as_slice()));
            insert_ec(&mut members, "P-256", x, y)?;
        }
        PublicKey::EcdsaP384(ec) => {
            let point = ec.to_encoded_point(false);
            let (x, y) = (point.x().map(|x| x.as_slice()), point.y().map(|y| y.as_slice()));
            insert_ec(&mut members, "P-384", x, y)?;
        }
        PublicKey::EcdsaP521(ec) => {
            let point = ec.to_encoded_point(false);
            let (x, y) = (point.x().map(|x| x.as_slice()), point.y().map(|y| y.as_slice()));
            insert_ec(&mut members, "P-521", x, y)?;
        }
        PublicKey::Ed25519(ed) => {
            members.insert("kty", "OKP".to_string());
            members.insert("crv", "Ed25519".to_string());
            members.insert("x", b64(ed.as_bytes()));
        }
    }
    Ok(members)
}

// Coordinates come from an uncompressed SEC1 point, so both are present and
// already padded to the curve's field size.
fn insert_ec(
    members: &mut JwkMembers,
    crv: &'static str,
    x: Option<&[u8]>,
    y: Option<&[u8]>,
) -> Result<(), KeyEncodingError> {
    let (Some(x), Some(y)) = (x, y) else {
        return Err(KeyEncodingError::MalformedKey(format!(
            "{crv} point is not in uncompressed form"
        )));
    };
    members.insert("kty", "EC".to_string());
    members.insert("crv", crv.to_string());
    members.insert("x", b64(x));
    members.insert("y", b64(y));
    Ok(())
}

/// The canonical JSON serialization hashed by [`thumbprint`].
pub fn canonical_jwk(key: &PublicKey) -> Result<String, KeyEncodingError> {
    let members = required_members(key)?;
    serde_json::to_string(&members).map_err(|e| KeyEncodingError::MalformedKey(e.to_string()))
}

/// Computes the RFC 7638 SHA-256 thumbprint of `key`, base64url encoded.
///
/// # Errors
/// Returns `KeyEncodingError` if the key has no JWK representation.
pub fn thumbprint(key: &PublicKey) -> Result<String, KeyEncodingError> {
    let jwk = canonical_jwk(key)?;
    Ok(b64(&Sha256::digest(jwk.as_bytes())))
}

/// Computes the thumbprint of the key carried in an X.509 `SubjectPublicKeyInfo`.
pub fn thumbprint_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<String, KeyEncodingError> {
    thumbprint(&PublicKey::from_spki(spki)?)
}

fn b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
