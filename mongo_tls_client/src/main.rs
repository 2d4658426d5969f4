use anyhow::Context;
use mongo_tls_client::{insert_over_tls, BootstrapConfiguration, SecureClientError};
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SecureClientError> {
    setup_tracing()?;

    let configuration = BootstrapConfiguration::default();
    insert_over_tls(&configuration).await?;

    println!("[INFO] Inserted document via SSL/TLS");
    Ok(())
}

/// Logs go to stderr as bunyan JSON so stdout only carries the result line.
fn setup_tracing() -> anyhow::Result<()> {
    // Redirect all `log`'s events to the subscriber, rustls logs through it
    LogTracer::init().context("Failed to set logger")?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let formatting_layer =
        BunyanFormattingLayer::new(env!("CARGO_PKG_NAME").into(), std::io::stderr);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(())
}
