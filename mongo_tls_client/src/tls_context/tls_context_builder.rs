use std::sync::Arc;

use rustls::{
    client::WebPkiServerVerifier, crypto::CryptoProvider, ClientConfig, RootCertStore,
};
use tracing::instrument;

use crate::{CaBundle, SecureClientError, TlsContext, TrustMaterial};

#[derive(Debug, Default)]
pub struct TlsContextBuilder {
    crypto_provider: Option<Arc<CryptoProvider>>,
}

impl TlsContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the crypto provider. Defaults to rustls' `ring` provider.
    ///
    /// Only [`TlsContext::client_config`] and [`TlsContext::verify_server_certificate`] use it.
    /// The driver is handed the CA bundle alone and negotiates with its own rustls setup.
    pub fn set_crypto_provider(mut self, provider: Arc<CryptoProvider>) -> Self {
        self.crypto_provider = Some(provider);
        self
    }

    /// Builds a [`TlsContext`] that trusts the CAs in `trust_material` and nothing else.
    ///
    /// May be called more than once, the builder only holds the provider choice.
    #[instrument(
        level = "debug",
        name = "Build TlsContext",
        skip_all,
        fields(certificates = trust_material.len())
    )]
    pub fn build(&self, trust_material: &TrustMaterial) -> Result<TlsContext, SecureClientError> {
        let provider = self
            .crypto_provider
            .clone()
            .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()));

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(trust_material.certificates().cloned());
        if ignored > 0 {
            tracing::warn!(ignored, "Skipped certificates that are not usable trust anchors");
        }
        if added == 0 {
            let err = SecureClientError::ConfigError(format!(
                "None of the {} certificates in the {} trust store is a usable trust anchor",
                trust_material.len(),
                trust_material.format()
            ));
            tracing::error!("{}", err);
            return Err(err);
        }
        tracing::trace!(added, "Root store assembled");

        let verifier = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .map_err(|e| {
                let err = SecureClientError::ConfigError(format!(
                    "Unable to create certificate verifier. Caused by: {}",
                    e
                ));
                tracing::error!("{}", err);
                err
            })?;

        let client_config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| {
                let err = SecureClientError::ConfigError(format!(
                    "Unable to initialise TLS provider. Caused by: {}",
                    e
                ));
                tracing::error!("{}", err);
                err
            })?
            .with_webpki_verifier(verifier.clone())
            .with_no_client_auth();

        let ca_bundle = CaBundle::write(trust_material.certificates())?;

        let context = TlsContext::new(Arc::new(client_config), verifier, ca_bundle);
        tracing::debug!("TlsContext built: {:?}", &context);
        Ok(context)
    }
}
