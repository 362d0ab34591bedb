//! Checks that every certificate in a set is listed on a denylist.
//!
//! All certificates are evaluated before a verdict is reached, so a failing
//! check reports every uncovered certificate rather than the first one.

use std::fmt;

use crate::cert::Certificate;
use crate::entry::Denylist;
use crate::error::MembershipError;

/// Identification of a certificate that has no denylist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncoveredCertificate {
    pub issuer: String,
    pub serial_number: String,
    pub jwk_thumbprint: String,
}

impl fmt::Display for UncoveredCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "issuer={} serial={} thumbprint={}",
            self.issuer, self.serial_number, self.jwk_thumbprint
        )
    }
}

/// Outcome of looking up one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateCoverage {
    pub issuer: String,
    pub serial_number: String,
    pub jwk_thumbprint: String,
    /// Reason of the matching entry, `None` when uncovered.
    pub reason: Option<String>,
    /// The public key has no JWK form and an empty thumbprint was used.
    pub thumbprint_degraded: bool,
}

impl CertificateCoverage {
    pub fn is_covered(&self) -> bool {
        self.reason.is_some()
    }

    fn lookup(
        issuer: String,
        serial_number: String,
        jwk_thumbprint: String,
        thumbprint_degraded: bool,
        denylist: &Denylist,
    ) -> Self {
        let reason = denylist
            .find(&issuer, &serial_number, &jwk_thumbprint)
            .map(|entry| entry.reason().to_string());
        Self {
            issuer,
            serial_number,
            jwk_thumbprint,
            reason,
            thumbprint_degraded,
        }
    }

    fn of(cert: &Certificate, denylist: &Denylist) -> Self {
        let issuer = cert.issuer_string();
        let serial_number = cert.serial_string();
        let (jwk_thumbprint, degraded) = match cert.key_thumbprint() {
            Ok(thumbprint) => (thumbprint, false),
            Err(err) => {
                tracing::warn!(
                    %issuer,
                    serial = %serial_number,
                    error = %err,
                    "public key has no JWK thumbprint, matching with an empty thumbprint"
                );
                (String::new(), true)
            }
        };
        Self::lookup(issuer, serial_number, jwk_thumbprint, degraded, denylist)
    }

    fn uncovered(&self) -> UncoveredCertificate {
        UncoveredCertificate {
            issuer: self.issuer.clone(),
            serial_number: self.serial_number.clone(),
            jwk_thumbprint: self.jwk_thumbprint.clone(),
        }
    }
}

/// Per-certificate results, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipReport {
    pub results: Vec<CertificateCoverage>,
}

impl MembershipReport {
    pub fn is_fully_covered(&self) -> bool {
        self.results.iter().all(CertificateCoverage::is_covered)
    }

    pub fn uncovered(&self) -> Vec<UncoveredCertificate> {
        self.results
            .iter()
            .filter(|result| !result.is_covered())
            .map(CertificateCoverage::uncovered)
            .collect()
    }

    pub fn covered_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_covered()).count()
    }
}

/// Looks up every certificate in `denylist` without failing.
pub fn audit(certificates: &[Certificate], denylist: &Denylist) -> MembershipReport {
    let results = certificates
        .iter()
        .map(|cert| CertificateCoverage::of(cert, denylist))
        .collect();
    let report = MembershipReport { results };
    tracing::debug!(
        certificates = certificates.len(),
        covered = report.covered_count(),
        "membership audit finished"
    );
    report
}

/// Succeeds only if every certificate is covered by an entry.
///
/// # Errors
/// `MembershipError::Uncovered` listing every certificate without an entry,
/// in input order.
pub fn check_all_denied(
    certificates: &[Certificate],
    denylist: &Denylist,
) -> Result<MembershipReport, MembershipError> {
    let report = audit(certificates, denylist);
    let uncovered = report.uncovered();
    if uncovered.is_empty() {
        Ok(report)
    } else {
        Err(MembershipError::Uncovered(uncovered))
    }
}
