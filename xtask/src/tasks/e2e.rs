use colored::Colorize;

use crate::{tasks::ci::run_cargo_tasks, DynError};

/// Runs the ignored tests. They expect a TLS-enabled server reachable through
/// `MONGO_TLS_TEST_URI` (default `localhost:27017`) that presents `testdata/mongod.pem`.
pub fn e2e() -> Result<(), DynError> {
    println!(
        "{}",
        "End-to-end tests need a running MongoDB server, see secure_bootstrap.rs".yellow()
    );
    run_cargo_tasks(&[(
        "cargo test on ignored end-to-end tests",
        vec!["test", "--package", "mongo_tls_client", "--", "--ignored"],
    )])
}
