//! # Denylist - Signed X.509 Certificate Denylists in Pure Rust
//!
//! Denylist maintains a list of certificates that must never be accepted for
//! TLS connections, even when their chain of trust is otherwise valid. The
//! list is published as a compact JWS so that clients can verify it with an
//! out-of-band trust anchor before honoring it.
//!
//! Every entry identifies one certificate by three values:
//! - **issuer**: the issuer name, rendered by [`dn::render`]
//! - **serialnumber**: the certificate serial number in decimal
//! - **jwkthumbprint**: the RFC 7638 SHA-256 thumbprint of the subject public key
//!
//! A certificate is covered only if all three values match an entry exactly.
//!
//! ## Supported Key Types
//!
//! - **RSA**: thumbprinting, and RS256/RS384/RS512 signing
//! - **ECDSA**: P-256, P-384 and P-521 curves (ES256/ES384/ES512)
//! - **Ed25519**: thumbprinting and EdDSA signing
//!
//! Certificates with any other key type can still be listed; their thumbprint
//! is empty and a warning is logged.
//!
//! ## Quick Start
//!
//! ### Publishing a Denylist
//!
//! ```rust,no_run
//! use denylist::{
//!     cert::Certificate,
//!     entry::{Denylist, Entry},
//!     jws::{self, Algorithm},
//!     key::KeyPair,
//! };
//!
//! # fn main() -> Result<(), denylist::error::DenylistError> {
//! let cert = Certificate::from_pem(&std::fs::read_to_string("leaf.pem").unwrap())?;
//! let denylist: Denylist = vec![Entry::from_certificate(&cert, "key compromise")].into();
//!
//! let key = KeyPair::generate_ed25519();
//! let signed = jws::sign(&denylist, &key, Algorithm::EdDSA)?;
//! println!("{signed}");
//! # Ok(())
//! # }
//! ```
//!
//! ### Verifying and Auditing
//!
//! ```rust,no_run
//! use denylist::{
//!     jws::{self, Algorithm},
//!     key::PublicKey,
//!     membership, pem_utils,
//! };
//!
//! # fn main() -> Result<(), denylist::error::DenylistError> {
//! let trust_anchor = PublicKey::from_pem(&std::fs::read_to_string("pubkey.pem").unwrap())?;
//! let token = std::fs::read_to_string("denylist.jws").unwrap();
//! let denylist = jws::verify(token.trim(), &trust_anchor, Algorithm::EdDSA)?;
//!
//! let certs: Vec<_> = pem_utils::load_certificates_from_dir(std::path::Path::new("certs"))?
//!     .into_iter()
//!     .map(|(_, cert)| cert)
//!     .collect();
//! membership::check_all_denied(&certs, &denylist)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Each operation has its own error type, and [`error::DenylistError`] wraps
//! all of them:
//!
//! ```rust
//! use denylist::{error::VerificationError, jws::{self, Algorithm}, key::KeyPair};
//!
//! let key = KeyPair::generate_ed25519();
//! match jws::verify("not-a-token", &key.public_key(), Algorithm::EdDSA) {
//!     Ok(_) => unreachable!(),
//!     Err(VerificationError::MalformedToken(msg)) => println!("Malformed token: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`thumbprint`]: RFC 7638 JWK thumbprints
//! - [`entry`]: Denylist entries and their JSON encoding
//! - [`jws`]: Compact JWS signing and fail-closed verification
//! - [`membership`]: Checking that certificates are covered by a denylist
//! - [`dn`]: Distinguished name rendering for the issuer field
//! - [`cert`]: Certificate parsing and the issuer/serial/key accessors
//! - [`key`]: Public keys and signing key pairs
//! - [`pem_utils`]: PEM framing and certificate directory loading
//! - [`error`]: Error types

pub mod cert;
pub mod dn;
pub mod entry;
pub mod error;
pub mod jws;
pub mod key;
pub mod membership;
pub mod pem_utils;
pub mod thumbprint;
