use crate::{SecureClientError, TrustedCertificate};

pub(crate) const PEM_PREFIX: &[u8] = b"-----BEGIN";

/// Reads every `CERTIFICATE` block of a PEM bundle. PEM carries no integrity check, so there
/// is no password to verify.
#[tracing::instrument(level = "debug", name = "Read PEM bundle", skip_all)]
pub(crate) fn read_pem_bundle(bytes: &[u8]) -> Result<Vec<TrustedCertificate>, SecureClientError> {
    let mut reader = bytes;
    let certificates = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            let err = SecureClientError::FormatError(format!("Invalid PEM data: {}", e));
            tracing::error!("{}", err);
            err
        })?;

    if certificates.is_empty() {
        return Err(SecureClientError::FormatError(
            "PEM bundle holds no CERTIFICATE blocks".to_string(),
        ));
    }

    Ok(certificates
        .into_iter()
        .enumerate()
        .map(|(index, certificate)| TrustedCertificate {
            alias: format!("pem-{}", index),
            certificate,
        })
        .collect())
}
