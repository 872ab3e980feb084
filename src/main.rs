//! Lookup service HTTP server
//!
//! Starts an Axum web server that serves user and note lookups and exposes
//! request metrics for Prometheus.

use clap::Parser;
use lookup_service::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    error::AppError,
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = &cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(path, template)?;
                println!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // Load configuration; a missing default file means built-in defaults
    let (config, config_source) = match Config::from_file(&cli.config) {
        Ok(config) => (config, cli.config.as_str()),
        Err(AppError::ConfigFileRead { source, .. })
            if cli.uses_default_config() && source.kind() == std::io::ErrorKind::NotFound =>
        {
            (Config::default(), "built-in defaults")
        }
        Err(e) => return Err(e.into()),
    };

    // Initialize telemetry
    telemetry::init(&config.observability.log_level);

    tracing::info!(
        config = config_source,
        "Starting lookup service on {}:{}",
        config.server.host,
        config.server.port
    );

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    // Registration failures (duplicate or invalid metrics) are fatal here
    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", addr);
    tracing::info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
