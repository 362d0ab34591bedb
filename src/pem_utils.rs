use std::path::{Path, PathBuf};

use crate::cert::Certificate;
use crate::error::ParseError;

pub const CERTIFICATE: &str = "CERTIFICATE";
pub const PUBLIC_KEY: &str = "PUBLIC KEY";
pub const RSA_PUBLIC_KEY: &str = "RSA PUBLIC KEY";
pub const PRIVATE_KEY: &str = "PRIVATE KEY";
pub const RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";

pub const PUBLIC_KEY_LABELS: &[&str] = &[PUBLIC_KEY, RSA_PUBLIC_KEY, CERTIFICATE];
pub const PRIVATE_KEY_LABELS: &[&str] = &[PRIVATE_KEY, RSA_PRIVATE_KEY];

/// Parse the first PEM block of `pem_str`, requiring one of the `expected` labels.
pub fn parse_block(pem_str: &str, expected: &'static [&'static str]) -> Result<pem::Pem, ParseError> {
    let block = pem::parse(pem_str)?;
    if !expected.contains(&block.tag()) {
        return Err(ParseError::UnexpectedLabel {
            found: block.tag().to_string(),
            expected,
        });
    }
    Ok(block)
}

/// Parse every `CERTIFICATE` block in a PEM bundle.
///
/// Blocks with other labels (for example a private key stored alongside the
/// certificate) are skipped. A bundle without any certificate is an error.
pub fn parse_certificates(pem_str: &str) -> Result<Vec<Certificate>, ParseError> {
    let certs = pem::parse_many(pem_str)?
        .iter()
        .filter(|block| block.tag() == CERTIFICATE)
        .map(|block| Certificate::from_der(block.contents()))
        .collect::<Result<Vec<_>, _>>()?;

    if certs.is_empty() {
        return Err(ParseError::Pem("no CERTIFICATE block found".to_string()));
    }
    Ok(certs)
}

/// Read a file to a string, mapping failures to `ParseError::Io`.
pub fn read_to_string(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load every certificate from the files directly inside `dir`.
///
/// Files are visited in path order so that reports are stable between runs.
/// Each file may hold several certificates; each certificate is returned with
/// the path it was read from.
pub fn load_certificates_from_dir(dir: &Path) -> Result<Vec<(PathBuf, Certificate)>, ParseError> {
    let io_error = |e: std::io::Error| ParseError::Io {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut paths = std::fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    paths.retain(|path| path.is_file());
    paths.sort();

    let mut certs = Vec::new();
    for path in paths {
        let contents = read_to_string(&path)?;
        let parsed = parse_certificates(&contents).map_err(|e| ParseError::InFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), count = parsed.len(), "loaded certificates");
        certs.extend(parsed.into_iter().map(|cert| (path.clone(), cert)));
    }
    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_rejects_unexpected_label() {
        let pem = pem::encode(&pem::Pem::new("EC PRIVATE KEY", vec![1, 2, 3]));
        let err = parse_block(&pem, PRIVATE_KEY_LABELS).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedLabel {
                found: "EC PRIVATE KEY".to_string(),
                expected: PRIVATE_KEY_LABELS,
            }
        );
    }

    #[test]
    fn test_parse_block_rejects_garbage() {
        assert!(matches!(
            parse_block("not a pem document", PUBLIC_KEY_LABELS),
            Err(ParseError::Pem(_))
        ));
    }

    #[test]
    fn test_parse_certificates_requires_a_certificate() {
        let pem = pem::encode(&pem::Pem::new(PUBLIC_KEY, vec![1, 2, 3]));
        assert!(matches!(parse_certificates(&pem), Err(ParseError::Pem(_))));
    }

    #[test]
    fn test_read_to_string_reports_path() {
        let err = read_to_string(Path::new("/nonexistent/denylist.json")).unwrap_err();
        match err {
            ParseError::Io { path, .. } => assert_eq!(path, "/nonexistent/denylist.json"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_load_certificates_from_dir_reports_unparsable_file() {
        let dir = std::env::temp_dir().join(format!("denylist-certs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let bad = dir.join("notes.txt");
        std::fs::write(&bad, "not a certificate").unwrap();

        let err = load_certificates_from_dir(&dir).unwrap_err();
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(err.to_string().starts_with("Failed to parse "));
        match err {
            ParseError::InFile { path, .. } => assert_eq!(path, bad.display().to_string()),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_load_certificates_from_missing_dir_is_io_error() {
        let err = load_certificates_from_dir(Path::new("/nonexistent/certs")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
