use mongo_tls_client::{
    execute_insert, load_trust_store, BootstrapConfiguration, ConnectionSettings, SecureClient,
    TlsContextBuilder,
};
use mongodb::bson::doc;
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Runs each stage by hand, then reads the collection back with a second client.
///
/// `DEMO_TRUST_STORE` and `DEMO_MONGO_URI` override the defaults.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let mut builder =
        BootstrapConfiguration::builder().set_document(doc! { "msg": "Hello from the demo!" });
    if let Ok(trust_store) = std::env::var("DEMO_TRUST_STORE") {
        builder = builder.set_trust_store(trust_store, "changeit");
    }
    if let Ok(uri) = std::env::var("DEMO_MONGO_URI") {
        builder = builder.set_connection_uri(&uri);
    }
    let configuration = builder.build()?;

    let trust_material = load_trust_store(
        &configuration.trust_store_path,
        &configuration.trust_store_password,
    )?;
    println!("Trusting {:?}", trust_material);

    let settings = ConnectionSettings::from(&configuration);
    let writer = SecureClient::connect(
        TlsContextBuilder::new().build(&trust_material)?,
        &configuration.connection_uri,
        &settings,
    )
    .await?;
    let acknowledgement = execute_insert(
        writer,
        &configuration.database_name,
        &configuration.collection_name,
        configuration.document.clone(),
    )
    .await?;
    println!("{}", acknowledgement);

    let reader = SecureClient::connect(
        TlsContextBuilder::new().build(&trust_material)?,
        &configuration.connection_uri,
        &settings,
    )
    .await?;
    let count = reader
        .count_documents(
            &configuration.database_name,
            &configuration.collection_name,
            configuration.document.clone(),
        )
        .await;
    reader.close().await;
    println!(
        "{}.{} now holds {} matching document(s)",
        configuration.database_name,
        configuration.collection_name,
        count?
    );

    Ok(())
}

fn setup_tracing() {
    LogTracer::init().expect("Failed to set logger");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new("mongo-tls-demo".into(), std::io::stderr);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    set_global_default(subscriber).expect("Failed to set subscriber");
}
