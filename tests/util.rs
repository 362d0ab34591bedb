use std::path::PathBuf;

use denylist::cert::Certificate;
use denylist::key::{KeyPair, PublicKey};

pub const TEST_CA_ISSUER: &str = "CN=Denylist Test CA,O=Example Denylist,C=NL";

/// Leaf certificates issued by the test CA: file name, decimal serial, thumbprint.
pub const LEAVES: &[(&str, &str, &str)] = &[
    (
        "certs/leaf-rsa.pem",
        "1000",
        "NVt1leFimREFpyJP9I9IkJ20flMLFXud7srYrhVhsMQ",
    ),
    (
        "certs/leaf-p256.pem",
        "20988295479420645121",
        "oIM0wICVN23tdwqJjakIHqHqsBbZq09ebvzgER3lU3s",
    ),
    (
        "certs/leaf-p384.pem",
        "42",
        "kHvEgAydyl1Yembmdr-gOVAtms9CJ1rgDkFHCCYb4m4",
    ),
    (
        "certs/leaf-p521.pem",
        "43",
        "aZvZVBQjrh4EX55woFPAv36QGIJpEGwnPMs9ByHHdVs",
    ),
    (
        "certs/leaf-ed25519.pem",
        "44",
        "82SkzUhYLYaeNmA__2iCs1f3PTGwZ425B7bAwQ3doas",
    ),
];

/// Certificates exercising issuer rendering and key sizes: file name, decimal
/// serial, issuer. The issuers are the strings Go's `pkix.Name.String` gives.
pub const NAME_FIXTURES: &[(&str, &str, &str)] = &[
    ("names/reordered.pem", "101", "CN=Odd Order,O=Example,C=NL"),
    (
        "names/email.pem",
        "102",
        "CN=Mail CA,O=Example,C=NL,1.2.840.113549.1.9.1=#0c0e6361406578616d706c652e6f7267",
    ),
    (
        "names/escaped.pem",
        "103",
        r"CN=\#1 Test\; CA\ ,OU=Dev+OU=Ops,O=Example\, Inc.,C=NL,0.9.2342.19200300.100.1.25=#13036f7267",
    ),
    (
        "names/rsa8192.pem",
        "104",
        "CN=Large RSA Key,O=Example Denylist,C=NL",
    ),
];

pub const RSA_8192_THUMBPRINT: &str = "qvHA5L7qamWey3Ff0zuXurFBBATxya9TjAkZjPaTLyc";

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).unwrap()
}

pub fn load_cert(name: &str) -> Certificate {
    Certificate::from_pem(&read_fixture(name)).unwrap()
}

pub fn load_leaves() -> Vec<Certificate> {
    LEAVES.iter().map(|(name, _, _)| load_cert(name)).collect()
}

pub fn load_key_pair(name: &str) -> KeyPair {
    KeyPair::from_pem(&read_fixture(name)).unwrap()
}

pub fn load_public_key(name: &str) -> PublicKey {
    PublicKey::from_pem(&read_fixture(name)).unwrap()
}
