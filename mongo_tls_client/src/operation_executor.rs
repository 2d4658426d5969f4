use std::{fmt, future::Future};

use mongodb::bson::{Bson, Document};
use tracing::instrument;

use crate::{SecureClient, SecureClientError};

/// What the server handed back for a successful insert.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertAcknowledgement {
    pub database: String,
    pub collection: String,
    pub inserted_id: Bson,
}

impl fmt::Display for InsertAcknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inserted {} into {}.{}",
            self.inserted_id, self.database, self.collection
        )
    }
}

/// A connection that can take one document and then be released.
pub trait DocumentWriter {
    fn insert_document(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> impl Future<Output = Result<InsertAcknowledgement, SecureClientError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send;
}

impl DocumentWriter for SecureClient {
    async fn insert_document(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> Result<InsertAcknowledgement, SecureClientError> {
        let result = self
            .driver_client()
            .database(database)
            .collection::<Document>(collection)
            .insert_one(document)
            .await
            .map_err(|e| {
                tracing::error!("Insert rejected. Caused by: {}", e);
                SecureClientError::WriteError(e)
            })?;

        Ok(InsertAcknowledgement {
            database: database.to_string(),
            collection: collection.to_string(),
            inserted_id: result.inserted_id,
        })
    }

    async fn close(self) {
        SecureClient::close(self).await
    }
}

/// Inserts `document` into `database.collection` and releases `writer` afterwards.
///
/// The writer is closed on every path, so a rejected write still tears the connection down.
#[instrument(level = "debug", name = "Execute Insert", skip(writer, document))]
pub async fn execute_insert<W: DocumentWriter>(
    writer: W,
    database: &str,
    collection: &str,
    document: Document,
) -> Result<InsertAcknowledgement, SecureClientError> {
    tracing::trace!("Inserting {}", &document);
    let outcome = writer.insert_document(database, collection, document).await;
    writer.close().await;

    match &outcome {
        Ok(acknowledgement) => tracing::info!("{}", acknowledgement),
        Err(e) => tracing::error!("Insert failed, client released. Caused by: {}", e),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    };

    use mongodb::bson::{doc, Bson, Document};

    use crate::{InsertAcknowledgement, SecureClientError};

    use super::{execute_insert, DocumentWriter};

    #[derive(Default)]
    struct WriterState {
        inserts: AtomicUsize,
        closed: AtomicBool,
    }

    struct FakeWriter {
        state: Arc<WriterState>,
        fail: bool,
    }

    impl DocumentWriter for FakeWriter {
        async fn insert_document(
            &self,
            database: &str,
            collection: &str,
            _document: Document,
        ) -> Result<InsertAcknowledgement, SecureClientError> {
            assert!(
                !self.state.closed.load(Ordering::SeqCst),
                "insert after close"
            );
            self.state.inserts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SecureClientError::WriteError(mongodb::error::Error::custom(
                    "E11000 duplicate key error",
                )));
            }
            Ok(InsertAcknowledgement {
                database: database.to_string(),
                collection: collection.to_string(),
                inserted_id: Bson::Int32(1),
            })
        }

        async fn close(self) {
            self.state.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn execute_insert_releases_writer_after_success() {
        // Arrange
        let state = Arc::new(WriterState::default());
        let writer = FakeWriter {
            state: state.clone(),
            fail: false,
        };

        // Act
        let acknowledgement =
            execute_insert(writer, "testdb", "test", doc! { "msg": "Hello TLS!" })
                .await
                .unwrap();

        // Assert
        assert_eq!(acknowledgement.to_string(), "Inserted 1 into testdb.test");
        assert_eq!(state.inserts.load(Ordering::SeqCst), 1);
        assert!(state.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn execute_insert_releases_writer_after_rejected_write() {
        // Arrange
        let state = Arc::new(WriterState::default());
        let writer = FakeWriter {
            state: state.clone(),
            fail: true,
        };

        // Act
        let result = execute_insert(writer, "testdb", "test", doc! { "msg": "Hello TLS!" }).await;

        // Assert
        assert!(matches!(result, Err(SecureClientError::WriteError(_))));
        assert_eq!(state.inserts.load(Ordering::SeqCst), 1);
        assert!(state.closed.load(Ordering::SeqCst));
    }
}
