//! Drives the stopping policy with a synthetic validation curve.
//!
//! Run with `RUST_LOG=early_stopping=debug,replay=info cargo run --example replay`.
//! Set `EARLY_STOPPING_CONFIG` to a JSON file to override patience / min_delta.

use rust_early_stopping::{EpochController, StoppingConfig, StoppingPolicy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "early_stopping=debug,rust_early_stopping=info,replay=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if let Ok(path) = std::env::var("EARLY_STOPPING_CONFIG") {
        tracing::info!("Loading configuration from {}", path);
        StoppingConfig::from_file(path)?
    } else {
        StoppingConfig::new(10, 1e-3)
    };

    let policy = StoppingPolicy::try_new(config)?;
    let mut controller = EpochController::new(policy, 200);

    // Fast initial descent, a noisy plateau, then slow drift upwards
    let report = controller.run(|epoch| {
        let t = epoch as f64;
        let wobble = 0.01 * (t * 1.7).sin();
        Ok(0.3 + 2.0 * (-t / 6.0).exp() + 0.002 * (t - 40.0).max(0.0) + wobble)
    })?;

    match report.stopped_at {
        Some(epoch) => tracing::info!(
            "Stopped early at epoch {} (lowest loss {:.4})",
            epoch,
            report.lowest_loss
        ),
        None => tracing::info!("Ran all {} epochs", report.epochs_run),
    }

    Ok(())
}
