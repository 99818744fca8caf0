use anyhow::Context;
use clap::Parser;
use postlens::{Application, Config, config::Args, telemetry};
use tokio::signal;
use tracing::{debug, info, warn};

/// Resolves with the name of the first termination signal received.
async fn termination_signal() -> &'static str {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = signal::ctrl_c() => "Ctrl+C",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(e) => {
                warn!("SIGTERM handler unavailable, listening for Ctrl+C only: {}", e);
                let _ = signal::ctrl_c().await;
                "Ctrl+C"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        "Ctrl+C"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();
    let config = Config::load(&args).with_context(|| format!("Invalid configuration in {}", args.config))?;

    if args.validate {
        println!("Configuration in {} is valid.", args.config);
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    debug!(config_file = %args.config, "Configuration loaded");

    if config.analysis.api_key.is_none() {
        warn!("OPENROUTER_API_KEY is not set; every upload will get degraded suggestions");
    }

    let app = Application::new(config)?;
    app.serve(async {
        let signal = termination_signal().await;
        info!("Received {}, shutting down gracefully...", signal);
    })
    .await
}
