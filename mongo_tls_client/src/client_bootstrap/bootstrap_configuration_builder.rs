use std::{path::PathBuf, time::Duration};

use mongodb::bson::Document;
use tracing::instrument;

use crate::{BootstrapConfiguration, SecureClientError};

/// Builds a [`BootstrapConfiguration`], starting from the fixed defaults.
#[derive(Debug, Default)]
pub struct BootstrapConfigurationBuilder {
    configuration: BootstrapConfiguration,
}

impl BootstrapConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_trust_store(mut self, path: impl Into<PathBuf>, password: &str) -> Self {
        self.configuration.trust_store_path = path.into();
        self.configuration.trust_store_password = password.to_string();
        self
    }

    pub fn set_connection_uri(mut self, uri: &str) -> Self {
        tracing::trace!("Setting connection uri: {}", crate::redact_connection_uri(uri));
        self.configuration.connection_uri = uri.to_string();
        self
    }

    pub fn set_database_name(mut self, database_name: &str) -> Self {
        self.configuration.database_name = database_name.to_string();
        self
    }

    pub fn set_collection_name(mut self, collection_name: &str) -> Self {
        self.configuration.collection_name = collection_name.to_string();
        self
    }

    pub fn set_document(mut self, document: Document) -> Self {
        self.configuration.document = document;
        self
    }

    pub fn set_app_name(mut self, app_name: &str) -> Self {
        self.configuration.app_name = Some(app_name.to_string());
        self
    }

    pub fn set_connect_timeout(mut self, timeout: Duration) -> Self {
        self.configuration.connect_timeout = Some(timeout);
        self
    }

    pub fn set_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.configuration.server_selection_timeout = Some(timeout);
        self
    }

    /// Returns the configuration. The builder can be reused as a template afterwards.
    #[instrument(level = "debug", name = "Build BootstrapConfiguration", skip(self))]
    pub fn build(&self) -> Result<BootstrapConfiguration, SecureClientError> {
        if self.configuration.database_name.is_empty() {
            tracing::error!("A database name is required to know where to insert");
            return Err(SecureClientError::MissingSettingError {
                setting: "database_name",
            });
        }
        if self.configuration.collection_name.is_empty() {
            tracing::error!("A collection name is required to know where to insert");
            return Err(SecureClientError::MissingSettingError {
                setting: "collection_name",
            });
        }

        tracing::trace!("Bootstrap configuration: {:?}", &self.configuration);
        Ok(self.configuration.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mongodb::bson::doc;

    use crate::{BootstrapConfiguration, SecureClientError};

    #[test]
    fn bootstrapconfigurationbuilder_build_overrides_only_what_was_set() {
        // Arrange
        let builder = BootstrapConfiguration::builder()
            .set_trust_store("testdata/truststore.p12", "p4ss")
            .set_collection_name("audit")
            .set_document(doc! { "msg": "other" })
            .set_server_selection_timeout(Duration::from_millis(250));

        // Act
        let configuration = builder.build().unwrap();

        // Assert
        assert_eq!(
            configuration.trust_store_path.to_str(),
            Some("testdata/truststore.p12")
        );
        assert_eq!(configuration.trust_store_password, "p4ss");
        assert_eq!(configuration.database_name, "testdb");
        assert_eq!(configuration.collection_name, "audit");
        assert_eq!(configuration.document, doc! { "msg": "other" });
        assert_eq!(
            configuration.server_selection_timeout,
            Some(Duration::from_millis(250))
        );
        assert_eq!(configuration.connect_timeout, None);
    }

    #[test]
    fn bootstrapconfigurationbuilder_build_fails_for_empty_database_name() {
        let configuration = BootstrapConfiguration::builder()
            .set_database_name("")
            .build();

        assert!(matches!(
            configuration,
            Err(SecureClientError::MissingSettingError {
                setting: "database_name"
            })
        ));
    }

    #[test]
    fn bootstrapconfigurationbuilder_build_fails_for_empty_collection_name() {
        let configuration = BootstrapConfiguration::builder()
            .set_collection_name("")
            .build();

        assert!(matches!(
            configuration,
            Err(SecureClientError::MissingSettingError {
                setting: "collection_name"
            })
        ));
    }
}
