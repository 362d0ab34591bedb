//! String form of X.509 distinguished names used as the denylist `issuer`.
//!
//! Relying parties compare issuers using the string Go's `pkix.Name.String`
//! produces, so names are rendered the same way:
//!
//! - The well-known attributes are regrouped in the fixed order C, ST, L,
//!   STREET, POSTALCODE, O, OU, CN, SERIALNUMBER. Repeated values of one type
//!   form a single `+` joined RDN; CN and SERIALNUMBER keep only their last
//!   value and are omitted when empty.
//! - Every other attribute becomes its own `<dotted-oid>=#<hex DER>` RDN, placed
//!   before the well-known ones.
//! - The sequence is written last RDN first, so a typical issuer reads
//!   `CN=...,O=...,C=...` with any unnamed attributes at the end.
//!
//! Values are escaped as in RFC 2253. The DER order of the RDNs in the
//! certificate does not influence the result.

use const_oid::ObjectIdentifier;
use der::{Any, Encode, Tag, Tagged};
use x509_cert::name::Name;

/// Well-known attribute types in rendering order: OID, label, single-valued.
const WELL_KNOWN: [(ObjectIdentifier, &str, bool); 9] = [
    (ObjectIdentifier::new_unwrap("2.5.4.6"), "C", false),
    (ObjectIdentifier::new_unwrap("2.5.4.8"), "ST", false),
    (ObjectIdentifier::new_unwrap("2.5.4.7"), "L", false),
    (ObjectIdentifier::new_unwrap("2.5.4.9"), "STREET", false),
    (ObjectIdentifier::new_unwrap("2.5.4.17"), "POSTALCODE", false),
    (ObjectIdentifier::new_unwrap("2.5.4.10"), "O", false),
    (ObjectIdentifier::new_unwrap("2.5.4.11"), "OU", false),
    (ObjectIdentifier::new_unwrap("2.5.4.3"), "CN", true),
    (ObjectIdentifier::new_unwrap("2.5.4.5"), "SERIALNUMBER", true),
];

/// An attribute value as seen by the renderer.
enum Value {
    Text(String),
    /// A non-string value kept in its original DER encoding.
    Encoded(Vec<u8>),
    Unsupported,
}

impl Value {
    fn decode(any: &Any) -> Self {
        let bytes = any.value();
        match any.tag() {
            Tag::PrintableString
            | Tag::Utf8String
            | Tag::Ia5String
            | Tag::NumericString
            | Tag::TeletexString => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            Tag::BmpString => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                Value::Text(
                    char::decode_utf16(units)
                        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                        .collect(),
                )
            }
            Tag::Integer
            | Tag::BitString
            | Tag::ObjectIdentifier
            | Tag::UtcTime
            | Tag::GeneralizedTime
            | Tag::OctetString => match any.to_der() {
                Ok(der) => Value::Encoded(der),
                Err(_) => Value::Unsupported,
            },
            _ => Value::Unsupported,
        }
    }
}

/// Renders `name` in the denylist issuer format.
pub fn render(name: &Name) -> String {
    let mut grouped: [Vec<String>; WELL_KNOWN.len()] = Default::default();
    let mut rdns = Vec::new();

    for atv in name.0.iter().flat_map(|rdn| rdn.0.iter()) {
        let value = Value::decode(&atv.value);
        match WELL_KNOWN.iter().position(|(oid, _, _)| *oid == atv.oid) {
            // Well-known types only carry string values.
            Some(index) => {
                if let Value::Text(text) = value {
                    grouped[index].push(text);
                }
            }
            None => rdns.push(render_unnamed(&atv.oid, value)),
        }
    }

    for ((_, label, single), values) in WELL_KNOWN.iter().zip(&grouped) {
        let values: Vec<&String> = if *single {
            values.last().filter(|v| !v.is_empty()).into_iter().collect()
        } else {
            values.iter().collect()
        };
        if values.is_empty() {
            continue;
        }
        let rdn: Vec<String> = values
            .iter()
            .map(|value| format!("{label}={}", escape(value)))
            .collect();
        rdns.push(rdn.join("+"));
    }

    rdns.reverse();
    rdns.join(",")
}

fn render_unnamed(oid: &ObjectIdentifier, value: Value) -> String {
    match value {
        Value::Text(text) => format!("{oid}=#{}", hex::encode(encode_text(&text))),
        Value::Encoded(der) => format!("{oid}=#{}", hex::encode(der)),
        Value::Unsupported => format!("{oid}={}", escape("<nil>")),
    }
}

// Text is re-encoded as PrintableString when every character allows it and as
// UTF8String otherwise, regardless of the string type in the certificate.
fn encode_text(text: &str) -> Vec<u8> {
    let tag = if text.bytes().all(is_printable) {
        0x13
    } else {
        0x0c
    };
    let mut der = vec![tag];
    der.extend(encode_length(text.len()));
    der.extend_from_slice(text.as_bytes());
    der
}

fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let mut out = vec![0x80 | (bytes.len() - skip) as u8];
    out.extend_from_slice(&bytes[skip..]);
    out
}

fn is_printable(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
        )
}

fn escape(value: &str) -> String {
    let last = value.len().saturating_sub(1);
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.char_indices() {
        let needs_escape = match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' => true,
            ' ' => i == 0 || i == last,
            '#' => i == 0,
            _ => false,
        };
        if needs_escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
