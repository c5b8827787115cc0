use std::future::Future;

use anyhow::Context;
use bioinfer_client::{ClientConfig, InferenceClient};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bioinfer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();

    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    tracing::debug!(api_host = %config.api_host, "Configuration loaded");

    let cancel = CancellationToken::new();
    let client = InferenceClient::new(&config)?.with_cancellation(cancel.clone());

    interruptible(commands::run(cli.command, &client), shutdown_signal(), &cancel).await
}

/// Run `work` until it finishes or `signal` fires. On a signal the
/// token is cancelled, `work` is dropped and an error is returned.
async fn interruptible<W, S>(work: W, signal: S, cancel: &CancellationToken) -> anyhow::Result<()>
where
    W: Future<Output = anyhow::Result<()>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = work => result,
        () = signal => {
            cancel.cancel();
            anyhow::bail!("Interrupted")
        }
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::warn!("Received SIGINT (Ctrl-C), stopping"),
        () = terminate => tracing::warn!("Received SIGTERM, stopping"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_stops_pending_work_with_error() {
        let cancel = CancellationToken::new();
        let work = std::future::pending::<anyhow::Result<()>>();

        let result = interruptible(work, async {}, &cancel).await;

        assert_eq!(result.unwrap_err().to_string(), "Interrupted");
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn finished_work_is_returned_unchanged() {
        let cancel = CancellationToken::new();

        let ok = interruptible(async { Ok(()) }, std::future::pending(), &cancel).await;
        assert!(ok.is_ok());

        let err = interruptible(
            async { Err(anyhow::anyhow!("boom")) },
            std::future::pending(),
            &cancel,
        )
        .await;
        assert_eq!(err.unwrap_err().to_string(), "boom");
        assert!(!cancel.is_cancelled());
    }
}
