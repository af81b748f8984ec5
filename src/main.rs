use clap::Parser;
use imageocr_gateway::{config::Config, server, Args};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from(args);

    tracing::info!("Starting imageocr-gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);
    if config.google_vision_api_key.is_none() {
        tracing::info!("No Cloud Vision key configured, `ocr` will use the free providers");
    }

    server::run(config).await
}
