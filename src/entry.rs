use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::cert::Certificate;
use crate::error::ParseError;

/// A certificate that must not be accepted for TLS connections.
///
/// Entries are matched against certificates by exact equality of issuer,
/// serial number and JWK thumbprint. The JSON member names are
/// `issuer`, `serialnumber`, `jwkthumbprint` and `reason`.
///
/// # Example
/// ```
/// use denylist::entry::Entry;
///
/// let entry = Entry::builder()
///     .issuer("CN=Example CA,O=Example,C=NL")
///     .serial_number("1000")
///     .jwk_thumbprint("NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs")
///     .reason("key compromise")
///     .build();
/// assert_eq!(entry.serial_number(), "1000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
pub struct Entry {
    /// Issuer name as rendered by [`crate::dn::render`].
    #[builder(into)]
    issuer: String,

    /// Decimal certificate serial number.
    #[serde(rename = "serialnumber")]
    #[builder(into)]
    serial_number: String,

    /// RFC 7638 thumbprint of the certificate public key, empty when the key
    /// has no JWK representation.
    #[serde(rename = "jwkthumbprint")]
    #[builder(into, default)]
    jwk_thumbprint: String,

    /// Why the certificate is denied.
    #[builder(into, default)]
    reason: String,
}

impl Entry {
    pub fn new(
        issuer: impl Into<String>,
        serial_number: impl Into<String>,
        jwk_thumbprint: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            serial_number: serial_number.into(),
            jwk_thumbprint: jwk_thumbprint.into(),
            reason: reason.into(),
        }
    }

    /// Builds the entry that denies `cert`.
    ///
    /// A public key without a JWK representation yields an empty thumbprint.
    /// That degraded entry still matches on issuer and serial number, but any
    /// other certificate with an unsupported key and the same issuer/serial
    /// would match it too, so a warning is logged.
    pub fn from_certificate(cert: &Certificate, reason: impl Into<String>) -> Self {
        let issuer = cert.issuer_string();
        let serial_number = cert.serial_string();
        let jwk_thumbprint = cert.key_thumbprint().unwrap_or_else(|err| {
            tracing::warn!(
                %issuer,
                serial = %serial_number,
                error = %err,
                "public key has no JWK thumbprint, using an empty thumbprint"
            );
            String::new()
        });
        Self::new(issuer, serial_number, jwk_thumbprint, reason)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn jwk_thumbprint(&self) -> &str {
        &self.jwk_thumbprint
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Whether this entry refers to the certificate identified by the triple.
    pub fn matches(&self, issuer: &str, serial_number: &str, jwk_thumbprint: &str) -> bool {
        self.issuer == issuer
            && self.serial_number == serial_number
            && self.jwk_thumbprint == jwk_thumbprint
    }

    /// Human-editable rendering, indented by four spaces.
    pub fn to_json_pretty(&self) -> Result<String, ParseError> {
        to_json_indented(self)
    }
}

/// An ordered collection of denylist entries, signed as a whole.
///
/// Order is preserved through serialization but carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denylist {
    entries: Vec<Entry>,
}

impl Denylist {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// First entry matching the issuer/serial/thumbprint triple.
    pub fn find(&self, issuer: &str, serial_number: &str, jwk_thumbprint: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.matches(issuer, serial_number, jwk_thumbprint))
    }

    /// Compact JSON encoding; this is the exact byte string that gets signed.
    pub fn to_json(&self) -> Result<Vec<u8>, ParseError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Human-editable rendering, the format of `denylist.json`.
    pub fn to_json_pretty(&self) -> Result<String, ParseError> {
        to_json_indented(self)
    }

    /// Parses a JSON array of entries.
    ///
    /// # Errors
    /// `ParseError::Json` if the input is not an array of objects carrying all
    /// four string members.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ParseError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<Vec<Entry>> for Denylist {
    fn from(entries: Vec<Entry>) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<Entry> for Denylist {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Denylist {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn to_json_indented<T: Serialize>(value: &T) -> Result<String, ParseError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| ParseError::Json(e.to_string()))
}
