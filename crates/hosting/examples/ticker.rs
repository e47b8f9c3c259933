use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use steward_bootable::Bootable;
use steward_hosting::{HostedLifecycle, HostedLifecycleOptions};
use steward_lifecycle::{AsyncService, Lifecycle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Ticker {
    period: Duration,
    ticks: AtomicU64,
}

#[async_trait]
impl AsyncService for Ticker {
    type Error = Infallible;

    fn name(&self) -> &str {
        "ticker"
    }

    async fn execute(&self, token: CancellationToken) -> Result<(), Self::Error> {
        let mut interval = tokio::time::interval(self.period);

        loop {
            tokio::select! {
                () = token.cancelled() => return Ok(()),
                _ = interval.tick() => {
                    let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(tick, "tick");
                }
            }
        }
    }

    async fn teardown(&self) -> Result<(), Self::Error> {
        info!(total = self.ticks.load(Ordering::Relaxed), "ticker stopped");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ticker = Ticker {
        period: Duration::from_secs(1),
        ticks: AtomicU64::new(0),
    };

    let hosted = HostedLifecycle::new(
        Lifecycle::new(ticker),
        HostedLifecycleOptions::default().with_shutdown_timeout(Duration::from_secs(5)),
    );

    if let Err(e) = hosted.start().await {
        error!(%e, "failed to start ticker");
        return;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        () = hosted.wait() => {}
    }

    if let Err(e) = hosted.shutdown().await {
        error!(%e, "failed to shut down ticker");
    }

    hosted.lifecycle().dispose().await;
}
