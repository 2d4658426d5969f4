use std::{io::Write, path::Path};

use pem::Pem;
use rustls::pki_types::CertificateDer;
use tempfile::NamedTempFile;

use crate::SecureClientError;

/// Trust anchors written out as a PEM file.
///
/// The driver only accepts custom CAs by file path, so the trust material is materialised here.
/// The file is private to this process and removed when the bundle is dropped.
#[derive(Debug)]
pub struct CaBundle {
    file: NamedTempFile,
    count: usize,
}

impl CaBundle {
    pub(crate) fn write<'a, 'b: 'a>(
        certificates: impl IntoIterator<Item = &'a CertificateDer<'b>>,
    ) -> Result<Self, SecureClientError> {
        let blocks = certificates
            .into_iter()
            .map(|c| Pem::new("CERTIFICATE", c.as_ref().to_vec()))
            .collect::<Vec<_>>();
        let count = blocks.len();

        let file = tempfile::Builder::new()
            .prefix("mongo-trust-")
            .suffix(".pem")
            .tempfile()
            .and_then(|mut file| {
                file.write_all(pem::encode_many(&blocks).as_bytes())?;
                file.flush()?;
                Ok(file)
            })
            .map_err(|e| {
                let err = SecureClientError::ConfigError(format!(
                    "Unable to write CA bundle for the driver. Caused by: {}",
                    e
                ));
                tracing::error!("{}", err);
                err
            })?;

        tracing::trace!(path = %file.path().display(), count, "CA bundle written");
        Ok(Self { file, count })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rustls::pki_types::CertificateDer;

    use super::CaBundle;

    #[test]
    fn ca_bundle_writes_one_block_per_certificate_and_cleans_up() {
        // Arrange
        let certificates = vec![
            CertificateDer::from(vec![1u8, 2, 3]),
            CertificateDer::from(vec![4u8, 5, 6]),
        ];

        // Act
        let bundle = CaBundle::write(&certificates).unwrap();
        let path = bundle.path().to_path_buf();
        let written = fs::read_to_string(&path).unwrap();

        // Assert
        assert_eq!(bundle.len(), 2);
        assert_eq!(written.matches("-----BEGIN CERTIFICATE-----").count(), 2);

        drop(bundle);
        assert!(!path.exists());
    }
}
