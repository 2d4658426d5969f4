use std::{fs::File, io::Read, path::Path};

use tracing::instrument;

use super::{
    jks_codec::{read_jks, JCEKS_MAGIC, JKS_MAGIC},
    pem_bundle::{read_pem_bundle, PEM_PREFIX},
    pkcs12_reader::read_pkcs12,
};
use crate::{SecureClientError, TrustMaterial, TrustStoreFormat};

/// ASN.1 `SEQUENCE` tag every DER encoded PKCS#12 archive starts with.
const DER_SEQUENCE_TAG: u8 = 0x30;

/// Reads the trust store at `path` and returns the CA certificates it vouches for.
///
/// The container is recognised from its content: JKS, PKCS#12 and PEM bundles are accepted.
/// The file is read in one go and closed before any parsing happens.
#[instrument(
    level = "debug",
    name = "Load Trust Store",
    skip_all,
    fields(path = %path.as_ref().display())
)]
pub fn load_trust_store(
    path: impl AsRef<Path>,
    password: &str,
) -> Result<TrustMaterial, SecureClientError> {
    let path = path.as_ref();

    let bytes = {
        let mut buf = Vec::new();
        File::open(path)
            .and_then(|mut file| file.read_to_end(&mut buf))
            .map_err(|source| {
                let err = SecureClientError::IoError {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::error!("{}", err);
                err
            })?;
        buf
    };
    tracing::trace!(len = bytes.len(), "Trust store read");

    let format = sniff_format(&bytes)?;
    let certificates = match format {
        TrustStoreFormat::Jks => read_jks(&bytes, password)?,
        TrustStoreFormat::Pkcs12 => read_pkcs12(&bytes, password)?,
        TrustStoreFormat::Pem => read_pem_bundle(&bytes)?,
    };

    let material = TrustMaterial::new(format, certificates);
    tracing::debug!(
        %format,
        count = material.len(),
        "Loaded trust material: {:?}",
        &material
    );
    Ok(material)
}

fn sniff_format(bytes: &[u8]) -> Result<TrustStoreFormat, SecureClientError> {
    if let Some(magic) = bytes.get(..4) {
        let magic = u32::from_be_bytes([magic[0], magic[1], magic[2], magic[3]]);
        if magic == JKS_MAGIC || magic == JCEKS_MAGIC {
            return Ok(TrustStoreFormat::Jks);
        }
    }

    let text_start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    if bytes[text_start..].starts_with(PEM_PREFIX) {
        return Ok(TrustStoreFormat::Pem);
    }

    match bytes.first() {
        Some(&DER_SEQUENCE_TAG) => Ok(TrustStoreFormat::Pkcs12),
        Some(_) => Err(SecureClientError::FormatError(
            "File is neither a JKS, PKCS#12 nor PEM trust store".to_string(),
        )),
        None => Err(SecureClientError::FormatError(
            "Trust store file is empty".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use crate::{SecureClientError, TrustStoreFormat};

    use super::{load_trust_store, sniff_format};

    fn testdata(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn load_trust_store_returns_material_for_valid_JKS() {
        // Act
        let material = load_trust_store(testdata("truststore.jks"), "changeit").unwrap();

        // Assert
        assert_eq!(material.format(), TrustStoreFormat::Jks);
        assert!(!material.is_empty());
        assert_eq!(material.aliases().collect::<Vec<_>>(), vec!["mongo-ca"]);
    }

    #[test]
    fn load_trust_store_returns_material_for_valid_PKCS12() {
        let material = load_trust_store(testdata("truststore.p12"), "changeit").unwrap();

        assert_eq!(material.format(), TrustStoreFormat::Pkcs12);
        assert_eq!(material.len(), 1);
    }

    #[test]
    fn load_trust_store_returns_material_for_keytool_default_PKCS12() {
        let material = load_trust_store(testdata("truststore_keytool.p12"), "changeit").unwrap();

        assert_eq!(material.format(), TrustStoreFormat::Pkcs12);
        assert_eq!(material.aliases().collect::<Vec<_>>(), vec!["mongo-ca"]);
    }

    #[test]
    fn load_trust_store_detects_PKCS12_behind_a_jks_file_name() {
        // Arrange
        // keytool writes PKCS#12 even when asked for `mongo-truststore.jks`.
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("mongo-truststore.jks");
        std::fs::copy(testdata("truststore_keytool.p12"), &path).unwrap();

        // Act
        let material = load_trust_store(&path, "changeit").unwrap();

        // Assert
        assert_eq!(material.format(), TrustStoreFormat::Pkcs12);
        assert_eq!(material.len(), 1);
    }

    #[test]
    fn load_trust_store_returns_material_for_PEM_regardless_of_password() {
        let material = load_trust_store(testdata("trusted_ca.pem"), "").unwrap();

        assert_eq!(material.format(), TrustStoreFormat::Pem);
        assert_eq!(material.len(), 1);
    }

    #[test]
    fn load_trust_store_fails_with_auth_error_for_wrong_password() {
        let result = load_trust_store(testdata("truststore.jks"), "letmein");

        assert!(matches!(result, Err(SecureClientError::AuthError(_))));
    }

    #[test]
    fn load_trust_store_fails_with_io_error_for_missing_file() {
        let result = load_trust_store(testdata("does-not-exist.jks"), "changeit");

        assert!(matches!(
            result,
            Err(SecureClientError::IoError { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn load_trust_store_fails_with_format_error_for_non_keystore() {
        let result = load_trust_store(testdata("not_a_keystore.txt"), "changeit");

        assert!(matches!(result, Err(SecureClientError::FormatError(_))));
    }

    #[test]
    fn sniff_format_fails_for_empty_input() {
        assert!(matches!(
            sniff_format(&[]),
            Err(SecureClientError::FormatError(_))
        ));
    }

    #[test]
    fn sniff_format_tolerates_leading_whitespace_before_PEM() {
        assert_eq!(
            sniff_format(b"\n  -----BEGIN CERTIFICATE-----").unwrap(),
            TrustStoreFormat::Pem
        );
    }
}
