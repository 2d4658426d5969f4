/*!
mongo_tls_client connects to a MongoDB server over TLS using a custom trust store and
performs a single insert.

The flow is strictly linear:

1. [`load_trust_store`] reads a JKS, PKCS#12 or PEM trust store into [`TrustMaterial`].
2. [`TlsContextBuilder`] turns the trust material into a [`TlsContext`] that validates the
   server certificate against those CAs only. No client certificate is presented.
3. [`SecureClient::connect`] hands the context to the driver together with the connection
   URI and checks the server is reachable and accepts the credentials.
4. [`execute_insert`] writes one document and releases the client whether the write worked
   or not.

[`insert_over_tls`] chains all four stages from a [`BootstrapConfiguration`].

# Example
```rust,no_run
# tokio_test::block_on(async {
use mongo_tls_client::{insert_over_tls, BootstrapConfiguration};

let configuration = BootstrapConfiguration::builder()
    .set_trust_store("./truststore/mongo-truststore.jks", "changeit")
    .set_database_name("testdb")
    .set_collection_name("test")
    .build()
    .unwrap();

let acknowledgement = insert_over_tls(&configuration).await.unwrap();
println!("{}", acknowledgement);
# })
```
*/

mod client_bootstrap;
mod operation_executor;
mod secure_bootstrap;
mod secure_client_error;
mod tls_context;
mod trust_store;

pub use client_bootstrap::*;
pub use operation_executor::*;
pub use secure_bootstrap::*;
pub use secure_client_error::*;
pub use tls_context::*;
pub use trust_store::*;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
