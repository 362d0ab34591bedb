use der::{Decode, Encode};
use rsa::BigUint;

use crate::dn;
use crate::error::{KeyEncodingError, ParseError};
use crate::key::PublicKey;
use crate::pem_utils;
use crate::thumbprint;

/// Represents an X.509 certificate that may be listed on a denylist.
///
/// Exposes the three values a denylist entry is keyed on: the issuer name,
/// the serial number and the JWK thumbprint of the subject public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    /// Decodes a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, ParseError> {
        let inner = x509_cert::Certificate::from_der(der)?;
        Ok(Self { inner })
    }

    /// Decodes the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(pem_str: &str) -> Result<Self, ParseError> {
        let block = pem_utils::parse_block(pem_str, &[pem_utils::CERTIFICATE])?;
        Self::from_der(block.contents())
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>, ParseError> {
        Ok(self.inner.to_der()?)
    }

    /// The issuer name in the denylist format (`CN=...,O=...,C=...`), see
    /// [`dn::render`].
    pub fn issuer_string(&self) -> String {
        dn::render(&self.inner.tbs_certificate.issuer)
    }

    /// The subject name, rendered like the issuer.
    pub fn subject_string(&self) -> String {
        dn::render(&self.inner.tbs_certificate.subject)
    }

    /// The serial number in decimal.
    pub fn serial_string(&self) -> String {
        decimal_serial(self.inner.tbs_certificate.serial_number.as_bytes())
    }

    /// The subject public key.
    pub fn public_key(&self) -> Result<PublicKey, KeyEncodingError> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// RFC 7638 thumbprint of the subject public key.
    pub fn key_thumbprint(&self) -> Result<String, KeyEncodingError> {
        thumbprint::thumbprint(&self.public_key()?)
    }
}

// DER INTEGER content is two's complement, so a set high bit means negative.
fn decimal_serial(bytes: &[u8]) -> String {
    let magnitude = BigUint::from_bytes_be(bytes);
    match bytes.first() {
        Some(first) if first & 0x80 != 0 => {
            let modulus = BigUint::from(1u64) << (bytes.len() * 8);
            format!("-{}", modulus - magnitude)
        }
        _ => magnitude.to_string(),
    }
}
