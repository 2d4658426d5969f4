use std::fmt;

use rustls::pki_types::CertificateDer;

/// Container a [`TrustMaterial`] was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustStoreFormat {
    Jks,
    Pkcs12,
    Pem,
}

impl fmt::Display for TrustStoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustStoreFormat::Jks => write!(f, "JKS"),
            TrustStoreFormat::Pkcs12 => write!(f, "PKCS#12"),
            TrustStoreFormat::Pem => write!(f, "PEM"),
        }
    }
}

/// One CA certificate the trust store vouches for.
#[derive(Clone, Debug)]
pub struct TrustedCertificate {
    pub alias: String,
    pub certificate: CertificateDer<'static>,
}

/// The certificate authorities loaded from a trust store.
///
/// Read-only once loaded. The loader never hands out an empty one, but [`TrustMaterial::new`]
/// allows it so callers can assemble their own.
#[derive(Clone)]
pub struct TrustMaterial {
    format: TrustStoreFormat,
    certificates: Vec<TrustedCertificate>,
}

impl TrustMaterial {
    pub fn new(format: TrustStoreFormat, certificates: Vec<TrustedCertificate>) -> Self {
        Self {
            format,
            certificates,
        }
    }

    pub fn format(&self) -> TrustStoreFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.certificates.iter().map(|c| c.alias.as_str())
    }

    pub fn certificates(&self) -> impl Iterator<Item = &CertificateDer<'static>> {
        self.certificates.iter().map(|c| &c.certificate)
    }
}

// Certificate bytes are noise in logs, aliases are enough.
impl fmt::Debug for TrustMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustMaterial")
            .field("format", &self.format)
            .field("aliases", &self.aliases().collect::<Vec<_>>())
            .finish()
    }
}
