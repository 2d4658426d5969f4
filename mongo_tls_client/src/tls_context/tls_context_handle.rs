use std::{fmt, sync::Arc};

use rustls::{
    client::{danger::ServerCertVerifier, WebPkiServerVerifier},
    pki_types::{CertificateDer, ServerName, UnixTime},
    ClientConfig,
};

use crate::CaBundle;

/**
TLS settings for talking to the database server, derived from a [`TrustMaterial`](crate::TrustMaterial).

Immutable once built. The same verifier backs [`TlsContext::client_config`] and
[`TlsContext::verify_server_certificate`]. The driver only sees the [`CaBundle`], holding the
same anchors, so cipher or provider choices made here do not reach the database connection.
Only server authentication is configured.
*/
pub struct TlsContext {
    client_config: Arc<ClientConfig>,
    verifier: Arc<WebPkiServerVerifier>,
    ca_bundle: CaBundle,
}

impl TlsContext {
    pub(crate) fn new(
        client_config: Arc<ClientConfig>,
        verifier: Arc<WebPkiServerVerifier>,
        ca_bundle: CaBundle,
    ) -> Self {
        Self {
            client_config,
            verifier,
            ca_bundle,
        }
    }

    /// The rustls configuration, for wrapping a transport directly.
    ///
    /// [`SecureClient`](crate::SecureClient) does not use it: the driver builds its own
    /// configuration from [`TlsContext::ca_bundle`].
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    pub fn ca_bundle(&self) -> &CaBundle {
        &self.ca_bundle
    }

    /// Checks a certificate chain presented by `host` against the trust material.
    pub fn verify_server_certificate(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        host: &str,
    ) -> Result<(), rustls::Error> {
        let server_name = ServerName::try_from(host).map_err(|e| {
            rustls::Error::General(format!("Invalid server name `{}`: {}", host, e))
        })?;

        self.verifier
            .verify_server_cert(end_entity, intermediates, &server_name, &[], UnixTime::now())
            .map(|_| ())
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("ca_bundle", &self.ca_bundle.path())
            .field("trust_anchors", &self.ca_bundle.len())
            .finish()
    }
}
