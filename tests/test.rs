mod util;

use denylist::entry::{Denylist, Entry};
use denylist::error::{KeyEncodingError, MembershipError, VerificationError};
use denylist::jws::{self, Algorithm, SignedDenylist};
use denylist::key::PublicKey;
use denylist::membership;
use denylist::pem_utils;
use util::{LEAVES, NAME_FIXTURES, RSA_8192_THUMBPRINT, TEST_CA_ISSUER};

const KNOWN_ANSWER_ENTRY: (&str, &str, &str, &str) = (
    TEST_CA_ISSUER,
    "44",
    "82SkzUhYLYaeNmA__2iCs1f3PTGwZ425B7bAwQ3doas",
    "compromised",
);

fn fixture_denylist() -> Denylist {
    Denylist::from_json(util::read_fixture("denylist.json").as_bytes()).unwrap()
}

/// Issuer, serial and thumbprint of every supported leaf match the values
/// recorded in `denylist.json`.
#[test]
fn test_leaf_certificate_identifiers() {
    for (name, serial, thumbprint) in LEAVES {
        let cert = util::load_cert(name);
        assert_eq!(cert.issuer_string(), TEST_CA_ISSUER, "{name}");
        assert_eq!(cert.serial_string(), *serial, "{name}");
        assert_eq!(cert.key_thumbprint().unwrap(), *thumbprint, "{name}");
    }
}

/// Issuers follow the fixed attribute order regardless of the RDN order in
/// the certificate, and attributes without a short name come last as hex.
#[test]
fn test_issuer_strings_of_name_fixtures() {
    for (name, serial, issuer) in NAME_FIXTURES {
        let cert = util::load_cert(name);
        assert_eq!(cert.issuer_string(), *issuer, "{name}");
        assert_eq!(cert.subject_string(), *issuer, "{name}");
        assert_eq!(cert.serial_string(), *serial, "{name}");
    }
}

#[test]
fn test_rsa_8192_leaf_is_thumbprinted() {
    let cert = util::load_cert("names/rsa8192.pem");
    assert_eq!(cert.key_thumbprint().unwrap(), RSA_8192_THUMBPRINT);

    let entry = Entry::from_certificate(&cert, "oversized key");
    assert_eq!(entry.jwk_thumbprint(), RSA_8192_THUMBPRINT);

    let denylist: Denylist = vec![entry].into();
    let report = membership::check_all_denied(&[cert], &denylist).unwrap();
    assert!(!report.results[0].thumbprint_degraded);
}

#[test]
fn test_name_fixture_denylist_covers_only_listed_issuers() {
    let certs: Vec<_> = NAME_FIXTURES.iter().map(|(name, _, _)| util::load_cert(name)).collect();
    let listed: Denylist = certs
        .iter()
        .filter(|cert| cert.serial_string() != "102")
        .map(|cert| Entry::from_certificate(cert, "test"))
        .collect();
    let err = membership::check_all_denied(&certs, &listed).unwrap_err();
    let MembershipError::Uncovered(uncovered) = err;
    assert_eq!(uncovered.len(), 1);
    assert_eq!(uncovered[0].issuer, NAME_FIXTURES[1].2);
}

#[test]
fn test_ca_certificate_as_trust_anchor_input() {
    let ca = util::load_cert("ca.pem");
    assert_eq!(ca.subject_string(), TEST_CA_ISSUER);
    assert_eq!(ca.serial_string(), "1");

    let from_cert = PublicKey::from_pem(&util::read_fixture("ca.pem")).unwrap();
    assert_eq!(from_cert, ca.public_key().unwrap());
    assert_eq!(
        denylist::thumbprint::thumbprint(&from_cert).unwrap(),
        "p91D0i2MesHJTfK6rwZ_fTV78qnsyr55gdSneKeoRaM"
    );
}

#[test]
fn test_signer_public_key_thumbprints() {
    let expected = [
        ("signer-ed25519.pub", "fKXwJeHGDIH4dvaEfce82otDYxH2nt0tv7u-qpOJMAg"),
        ("signer-p256.pub", "w1jJ9weWYfhR80WYui-NMfZfTxuOaExsty8ruXyMwt8"),
        ("signer-rsa.pub", "CkxURBqOhM4nBsHX-fEV-zMJJz3i6ZT4muVmkCzuWSY"),
        ("other-ed25519.pub", "EqjqZuSRbVu2bFmTqk7EleCK4PLPIIg4Fr7gXAK4f5k"),
    ];
    for (name, thumbprint) in expected {
        let key = util::load_public_key(name);
        assert_eq!(denylist::thumbprint::thumbprint(&key).unwrap(), thumbprint, "{name}");
    }
}

#[test]
fn test_private_keys_match_public_keys() {
    let pairs = [
        ("signer-ed25519.key", "signer-ed25519.pub", Algorithm::EdDSA),
        ("signer-p256.key", "signer-p256.pub", Algorithm::ES256),
        ("signer-rsa.key", "signer-rsa.pub", Algorithm::RS256),
        ("signer-rsa-pkcs1.key", "signer-rsa.pub", Algorithm::RS256),
    ];
    for (private, public, algorithm) in pairs {
        let key = util::load_key_pair(private);
        assert_eq!(key.public_key(), util::load_public_key(public), "{private}");
        assert_eq!(key.default_algorithm(), algorithm, "{private}");
    }
}

#[test]
fn test_unsupported_key_type_degrades_to_empty_thumbprint() {
    let cert = util::load_cert("certs/leaf-ed448.pem");
    assert_eq!(cert.serial_string(), "45");
    assert_eq!(
        cert.issuer_string(),
        "CN=Unsupported Key Test,O=Example Denylist,C=NL"
    );
    assert!(matches!(
        cert.key_thumbprint(),
        Err(KeyEncodingError::UnsupportedKeyType(_))
    ));

    let entry = Entry::from_certificate(&cert, "unsupported key");
    assert_eq!(entry.jwk_thumbprint(), "");
    assert_eq!(entry.serial_number(), "45");

    let report = membership::check_all_denied(&[cert], &Denylist::new(vec![entry])).unwrap();
    assert!(report.results[0].thumbprint_degraded);
    assert!(report.results[0].is_covered());
}

#[test]
fn test_entry_from_certificate_matches_fixture_entries() {
    let from_certs: Denylist = LEAVES
        .iter()
        .map(|(name, _, _)| util::load_cert(name))
        .zip(fixture_denylist().iter())
        .map(|(cert, fixture)| Entry::from_certificate(&cert, fixture.reason()))
        .collect();
    assert_eq!(from_certs, fixture_denylist());
}

#[test]
fn test_known_answer_token_verifies() {
    let token = util::read_fixture("denylist.jws");
    let trust_anchor = util::load_public_key("signer-ed25519.pub");
    let denylist = jws::verify(token.trim(), &trust_anchor, Algorithm::EdDSA).unwrap();

    let (issuer, serial, thumbprint, reason) = KNOWN_ANSWER_ENTRY;
    assert_eq!(
        denylist.entries(),
        &[Entry::new(issuer, serial, thumbprint, reason)]
    );
}

#[test]
fn test_ed25519_signing_is_reproducible() {
    let (issuer, serial, thumbprint, reason) = KNOWN_ANSWER_ENTRY;
    let denylist = Denylist::new(vec![Entry::new(issuer, serial, thumbprint, reason)]);
    let key = util::load_key_pair("signer-ed25519.key");

    let signed = jws::sign(&denylist, &key, Algorithm::EdDSA).unwrap();
    assert_eq!(signed.as_str(), util::read_fixture("denylist.jws").trim());
}

#[test]
fn test_known_answer_token_rejects_other_trust_anchor() {
    let token = SignedDenylist::from_token(util::read_fixture("denylist.jws").trim());
    let other = util::load_public_key("other-ed25519.pub");
    assert_eq!(
        token.verify(&other, Algorithm::EdDSA),
        Err(VerificationError::BadSignature)
    );

    let rsa = util::load_public_key("signer-rsa.pub");
    assert!(matches!(
        token.verify(&rsa, Algorithm::RS256),
        Err(VerificationError::AlgorithmMismatch { .. })
    ));
}

#[test]
fn test_verify_is_strict_about_surrounding_whitespace() {
    let token = util::read_fixture("denylist.jws");
    let trust_anchor = util::load_public_key("signer-ed25519.pub");
    assert!(jws::verify(&token, &trust_anchor, Algorithm::EdDSA).is_err());
}

/// Publishes the fixture denylist with every signer and algorithm, then
/// audits all supported leaf certificates against the verified result.
#[test]
fn test_publish_verify_audit() {
    let signers = [
        ("signer-ed25519.key", "signer-ed25519.pub", Algorithm::EdDSA),
        ("signer-p256.key", "signer-p256.pub", Algorithm::ES256),
        ("signer-rsa.key", "signer-rsa.pub", Algorithm::RS256),
        ("signer-rsa.key", "signer-rsa.pub", Algorithm::RS384),
        ("signer-rsa-pkcs1.key", "signer-rsa.pub", Algorithm::RS512),
    ];
    let leaves = util::load_leaves();

    for (private, public, algorithm) in signers {
        let key = util::load_key_pair(private);
        let signed = jws::sign(&fixture_denylist(), &key, algorithm).unwrap();
        let trust_anchor = util::load_public_key(public);

        let verified = signed.verify(&trust_anchor, algorithm).unwrap();
        assert_eq!(verified, fixture_denylist(), "{private} {algorithm}");

        let report = membership::check_all_denied(&leaves, &verified).unwrap();
        assert_eq!(report.results.len(), LEAVES.len());
        assert!(report.results.iter().all(|r| !r.thumbprint_degraded));
    }
}

#[test]
fn test_missing_entries_are_all_reported() {
    let kept: Denylist = fixture_denylist()
        .iter()
        .filter(|entry| !["42", "1000"].contains(&entry.serial_number()))
        .cloned()
        .collect();

    let err = membership::check_all_denied(&util::load_leaves(), &kept).unwrap_err();
    let MembershipError::Uncovered(uncovered) = err;
    let serials: Vec<&str> = uncovered.iter().map(|u| u.serial_number.as_str()).collect();
    assert_eq!(serials, vec!["1000", "42"]);
    assert_eq!(uncovered[0].issuer, TEST_CA_ISSUER);
    assert_eq!(
        uncovered[0].jwk_thumbprint,
        "NVt1leFimREFpyJP9I9IkJ20flMLFXud7srYrhVhsMQ"
    );
}

#[test]
fn test_tampered_payload_is_rejected() {
    let key = util::load_key_pair("signer-ed25519.key");
    let trust_anchor = key.public_key();
    let signed = jws::sign(&fixture_denylist(), &key, Algorithm::EdDSA).unwrap();

    let shorter: Denylist = fixture_denylist().iter().skip(1).cloned().collect();
    let forged_payload = denylist_b64(&shorter);
    let segments: Vec<&str> = signed.as_str().split('.').collect();
    let forged = format!("{}.{forged_payload}.{}", segments[0], segments[2]);

    assert_eq!(
        jws::verify(&forged, &trust_anchor, Algorithm::EdDSA),
        Err(VerificationError::BadSignature)
    );
}

#[test]
fn test_audit_fixture_dir_reports_unlisted_ed448_leaf() {
    let certs: Vec<_> = pem_utils::load_certificates_from_dir(&util::fixture_path("certs"))
        .unwrap()
        .into_iter()
        .map(|(_, cert)| cert)
        .collect();
    let report = membership::audit(&certs, &fixture_denylist());
    assert_eq!(report.covered_count(), LEAVES.len());
    let uncovered = report.uncovered();
    assert_eq!(uncovered.len(), 1);
    assert_eq!(uncovered[0].serial_number, "45");
    assert_eq!(uncovered[0].jwk_thumbprint, "");
}

#[test]
fn test_load_certificates_from_fixture_dir() {
    let loaded = pem_utils::load_certificates_from_dir(&util::fixture_path("certs")).unwrap();
    let names: Vec<String> = loaded
        .iter()
        .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "leaf-ed25519.pem",
            "leaf-ed448.pem",
            "leaf-p256.pem",
            "leaf-p384.pem",
            "leaf-p521.pem",
            "leaf-rsa.pem",
        ]
    );
}

fn denylist_b64(denylist: &Denylist) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(denylist.to_json().unwrap())
}
