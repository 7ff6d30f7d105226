use anyhow::Context;
use clap::Parser;
use signal_dispatch_bot::algo::StubAlgo;
use signal_dispatch_bot::config::load_signal_config;
use signal_dispatch_bot::dispatch::{SignalDispatcher, SignalHandler};
use signal_dispatch_bot::http::{router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "bot", version, about = "Trading signal dispatcher over HTTP")]
struct Args {
    /// Signal action table (JSON).
    #[arg(long, env = "SIGNAL_CONFIG", default_value = "configs/signal-config.json")]
    config: PathBuf,

    /// Address the HTTP listener binds to.
    #[arg(long, env = "BOT_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = load_signal_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let registry = StubAlgo::registry().context("building algo capability registry")?;
    tracing::debug!(?registry, "algo capabilities");

    let dispatcher = SignalDispatcher::new(Arc::new(StubAlgo::new()), Arc::new(registry), Arc::new(config));
    let handler: Arc<dyn SignalHandler> = Arc::new(dispatcher);
    let app = router(AppState::new(handler));

    tracing::info!(bind = ?args.bind, "signal dispatcher starting");

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn every_flag_has_help_text() {
        let cmd = Args::command();
        cmd.clone().debug_assert();
        for arg in cmd.get_arguments() {
            let id = arg.get_id().as_str();
            if id == "help" || id == "version" {
                continue;
            }
            assert!(arg.get_help().is_some(), "--{id} has no help text");
        }
    }
}
