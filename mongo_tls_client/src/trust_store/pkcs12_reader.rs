use p12::{AlgorithmIdentifier, ContentInfo, EncryptedContentInfo, MacData, SafeBag, PFX};
use rustls::pki_types::CertificateDer;

use super::pkcs12_crypto::{bmp_password, is_pbes2, pbes2_decrypt, MacDigest};
use crate::{SecureClientError, TrustedCertificate};

fn format_error(message: String) -> SecureClientError {
    let err = SecureClientError::FormatError(message);
    tracing::error!("{}", err);
    err
}

/// Extracts the X.509 certificate bags of a PKCS#12 archive after checking its MAC.
///
/// Handles both the legacy SHA-1/RC2/3DES archives and the HMAC-SHA-2 with PBES2/AES ones
/// current `keytool` and OpenSSL write by default. Aliases come from the bag's friendly name.
#[tracing::instrument(level = "debug", name = "Read PKCS#12", skip_all)]
pub(crate) fn read_pkcs12(
    bytes: &[u8],
    password: &str,
) -> Result<Vec<TrustedCertificate>, SecureClientError> {
    let pfx = PFX::parse(bytes)
        .map_err(|e| format_error(format!("Invalid PKCS#12 structure: {:?}", e)))?;
    let bmp_password = bmp_password(password);

    let auth_safe = match &pfx.auth_safe {
        ContentInfo::Data(data) => data,
        other => {
            return Err(format_error(format!(
                "Unsupported PKCS#12 integrity mode `{}`",
                other.oid()
            )))
        }
    };

    let password_verified = match &pfx.mac_data {
        Some(mac_data) => {
            verify_mac(mac_data, auth_safe, &bmp_password)?;
            true
        }
        None => {
            tracing::warn!("PKCS#12 archive carries no integrity MAC");
            false
        }
    };

    let contents = yasna::parse_der(auth_safe, |r| r.collect_sequence_of(ContentInfo::parse))
        .map_err(|e| format_error(format!("Invalid PKCS#12 authenticated safe: {:?}", e)))?;

    let mut trusted = Vec::new();
    for content in &contents {
        let safe_contents = match content {
            ContentInfo::Data(data) => data.clone(),
            ContentInfo::EncryptedData(encrypted) => {
                match decrypt_safe_contents(
                    &encrypted.encrypted_content_info,
                    password,
                    &bmp_password,
                )? {
                    Some(plaintext) => plaintext,
                    None if password_verified => {
                        return Err(format_error(
                            "PKCS#12 bag does not decrypt although the MAC matched".to_string(),
                        ))
                    }
                    None => {
                        return Err(SecureClientError::AuthError(
                            "PKCS#12 bag does not decrypt with this password".to_string(),
                        ))
                    }
                }
            }
            ContentInfo::OtherContext(other) => {
                return Err(format_error(format!(
                    "Unsupported PKCS#12 content type `{}`",
                    other.content_type
                )))
            }
        };

        let bags = yasna::parse_der(&safe_contents, |r| r.collect_sequence_of(SafeBag::parse))
            .map_err(|e| format_error(format!("Invalid PKCS#12 safe contents: {:?}", e)))?;
        for bag in bags {
            if let Some(der) = bag.bag.get_x509_cert() {
                let alias = bag
                    .friendly_name()
                    .unwrap_or_else(|| format!("pkcs12-{}", trusted.len()));
                tracing::trace!(%alias, len = der.len(), "Read certificate bag");
                trusted.push(TrustedCertificate {
                    alias,
                    certificate: CertificateDer::from(der),
                });
            }
        }
    }

    if trusted.is_empty() {
        return Err(SecureClientError::FormatError(
            "PKCS#12 archive holds no certificates".to_string(),
        ));
    }

    Ok(trusted)
}

fn verify_mac(
    mac_data: &MacData,
    auth_safe: &[u8],
    bmp_password: &[u8],
) -> Result<(), SecureClientError> {
    let digest = match &mac_data.mac.digest_algorithm {
        AlgorithmIdentifier::Sha1 => Some(MacDigest::Sha1),
        AlgorithmIdentifier::OtherAlg(other) => MacDigest::from_oid(&other.algorithm_type),
        _ => None,
    }
    .ok_or_else(|| {
        format_error(format!(
            "Unsupported PKCS#12 MAC algorithm {:?}",
            mac_data.mac.digest_algorithm
        ))
    })?;
    tracing::trace!(?digest, iterations = mac_data.iterations, "Verifying PKCS#12 MAC");

    if !digest.verify(
        bmp_password,
        &mac_data.salt,
        mac_data.iterations,
        auth_safe,
        &mac_data.mac.digest,
    ) {
        return Err(SecureClientError::AuthError(
            "PKCS#12 MAC verification failed".to_string(),
        ));
    }
    Ok(())
}

fn decrypt_safe_contents(
    info: &EncryptedContentInfo,
    password: &str,
    bmp_password: &[u8],
) -> Result<Option<Vec<u8>>, SecureClientError> {
    match &info.content_encryption_algorithm {
        AlgorithmIdentifier::OtherAlg(other) if is_pbes2(&other.algorithm_type) => {
            let params = other
                .params
                .as_deref()
                .ok_or_else(|| format_error("PBES2 parameters are missing".to_string()))?;
            pbes2_decrypt(params, password, &info.encrypted_content)
        }
        AlgorithmIdentifier::OtherAlg(other) => Err(format_error(format!(
            "Unsupported PKCS#12 bag encryption `{}`",
            other.algorithm_type
        ))),
        legacy => Ok(legacy.decrypt_pbe(&info.encrypted_content, bmp_password)),
    }
}
