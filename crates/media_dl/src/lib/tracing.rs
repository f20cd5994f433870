use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new("media-dl".into(), std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer())
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .try_init()?;

    Ok(())
}
