//! Reader for the Java `JKS` keystore container.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! u32 magic (0xFEEDFEED) | u32 version (1 or 2) | u32 entry count
//! entry*: u32 tag | utf alias | u64 timestamp | tag-specific payload
//! [u8; 20] SHA-1 over (password as UTF-16BE | "Mighty Aphrodite" | every byte above)
//! ```
//!
//! `utf` is a `u16` length followed by (modified) UTF-8 bytes. Version 2 prefixes every
//! certificate with its type as a `utf` string.

use rustls::pki_types::CertificateDer;
use sha1::{Digest, Sha1};

use crate::{SecureClientError, TrustedCertificate};

pub(crate) const JKS_MAGIC: u32 = 0xFEED_FEED;
pub(crate) const JCEKS_MAGIC: u32 = 0xCECE_CECE;

const TAG_PRIVATE_KEY: u32 = 1;
const TAG_TRUSTED_CERTIFICATE: u32 = 2;
const DIGEST_LEN: usize = 20;
const INTEGRITY_SALT: &[u8] = b"Mighty Aphrodite";
const X509: &str = "X.509";

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SecureClientError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                SecureClientError::FormatError(format!(
                    "JKS data truncated at byte {}",
                    self.position
                ))
            })?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SecureClientError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn read_u16(&mut self) -> Result<u16, SecureClientError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, SecureClientError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, SecureClientError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    fn read_utf(&mut self) -> Result<String, SecureClientError> {
        let len = self.read_u16()? as usize;
        // Modified UTF-8 only differs from UTF-8 for NUL and supplementary characters.
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn read_blob(&mut self) -> Result<&'a [u8], SecureClientError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn read_certificate(&mut self, version: u32) -> Result<&'a [u8], SecureClientError> {
        if version == 2 {
            let certificate_type = self.read_utf()?;
            if certificate_type != X509 {
                return Err(SecureClientError::FormatError(format!(
                    "Unsupported certificate type `{}`",
                    certificate_type
                )));
            }
        }
        self.read_blob()
    }
}

/// Reads the trusted certificate entries of a JKS keystore and checks its integrity digest
/// against `password`.
///
/// Private key entries are skipped. A structurally broken file is a `FormatError`, a digest
/// mismatch is an `AuthError`.
#[tracing::instrument(level = "debug", name = "Read JKS", skip_all)]
pub(crate) fn read_jks(
    bytes: &[u8],
    password: &str,
) -> Result<Vec<TrustedCertificate>, SecureClientError> {
    let mut reader = Reader::new(bytes);

    match reader.read_u32()? {
        JKS_MAGIC => {}
        JCEKS_MAGIC => {
            return Err(SecureClientError::FormatError(
                "JCEKS keystores are not supported".to_string(),
            ))
        }
        other => {
            return Err(SecureClientError::FormatError(format!(
                "Bad JKS magic {:#010x}",
                other
            )))
        }
    }

    let version = reader.read_u32()?;
    if version != 1 && version != 2 {
        return Err(SecureClientError::FormatError(format!(
            "Unsupported JKS version {}",
            version
        )));
    }

    let count = reader.read_u32()?;
    tracing::trace!(version, count, "JKS header read");

    let mut trusted = Vec::new();
    for _ in 0..count {
        let tag = reader.read_u32()?;
        let alias = reader.read_utf()?;
        let _created_at_millis = reader.read_u64()?;

        match tag {
            TAG_PRIVATE_KEY => {
                reader.read_blob()?;
                let chain_len = reader.read_u32()?;
                for _ in 0..chain_len {
                    reader.read_certificate(version)?;
                }
                tracing::debug!(%alias, "Skipping private key entry");
            }
            TAG_TRUSTED_CERTIFICATE => {
                let der = reader.read_certificate(version)?;
                tracing::trace!(%alias, len = der.len(), "Read trusted certificate entry");
                trusted.push(TrustedCertificate {
                    alias,
                    certificate: CertificateDer::from(der.to_vec()),
                });
            }
            other => {
                return Err(SecureClientError::FormatError(format!(
                    "Unknown entry tag {} for alias `{}`",
                    other, alias
                )));
            }
        }
    }

    let body_len = reader.position;
    let stored_digest = reader.take(DIGEST_LEN)?;
    if reader.remaining() != 0 {
        return Err(SecureClientError::FormatError(format!(
            "{} unexpected bytes after the integrity digest",
            reader.remaining()
        )));
    }

    if integrity_digest(password, &bytes[..body_len]) != stored_digest {
        return Err(SecureClientError::AuthError(
            "Keystore was tampered with, or password was incorrect".to_string(),
        ));
    }

    if trusted.is_empty() {
        return Err(SecureClientError::FormatError(
            "Keystore holds no trusted certificate entries".to_string(),
        ));
    }

    Ok(trusted)
}

pub(crate) fn integrity_digest(password: &str, body: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    for unit in password.encode_utf16() {
        hasher.update(unit.to_be_bytes());
    }
    hasher.update(INTEGRITY_SALT);
    hasher.update(body);
    hasher.finalize().to_vec()
}
