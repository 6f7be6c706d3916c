//! Trust configuration for HTTPS backends with private CAs.

use rustls_pemfile::certs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Failed to read certificate file: {0}")]
    CertReadError(#[from] std::io::Error),

    #[error("No certificates found in file")]
    NoCertificates,

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),
}

/// Load every certificate of a PEM bundle as an additional trust root.
pub fn load_ca_certificates(path: &Path) -> Result<Vec<reqwest::Certificate>, TlsError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let ders: Vec<_> = certs(&mut reader).collect::<Result<_, _>>()?;
    if ders.is_empty() {
        return Err(TlsError::NoCertificates);
    }

    ders.iter()
        .map(|der| {
            reqwest::Certificate::from_der(der.as_ref())
                .map_err(|e| TlsError::InvalidCertificate(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_bundle_is_io_error() {
        let result = load_ca_certificates(Path::new("/nonexistent/ca.pem"));
        assert!(matches!(result, Err(TlsError::CertReadError(_))));
    }

    #[test]
    fn bundle_without_certificates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();
        let result = load_ca_certificates(file.path());
        assert!(matches!(result, Err(TlsError::NoCertificates)));
    }
}
