//! Bridges a [`Lifecycle`] onto the host's [`Bootable`] contract.
//!
//! Booting starts the service in the background and returns once setup has
//! resolved; an unsuccessful setup fails the boot. Shutting down requests a
//! stop and waits for teardown, up to a deadline.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;

pub use error::Error;

use std::time::Duration;

use async_trait::async_trait;
use steward_bootable::Bootable;
use steward_lifecycle::{AsyncService, Lifecycle, StopRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default time a shutdown waits for teardown to finish.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for configuring a `HostedLifecycle`.
#[derive(Clone, Debug)]
pub struct HostedLifecycleOptions {
    /// How long `shutdown` waits for the service to stop.
    pub shutdown_timeout: Duration,

    /// Host-wide token handed to the lifecycle when it boots. Cancelling it
    /// stops the service just like a shutdown request.
    pub token: CancellationToken,
}

impl Default for HostedLifecycleOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            token: CancellationToken::new(),
        }
    }
}

impl HostedLifecycleOptions {
    /// Sets the shutdown deadline.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Sets the host-wide cancellation token.
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }
}

/// A lifecycle that a host can boot and shut down.
#[derive(Debug)]
pub struct HostedLifecycle<S: AsyncService> {
    lifecycle: Lifecycle<S>,
    shutdown_timeout: Duration,
    token: CancellationToken,
}

impl<S: AsyncService> HostedLifecycle<S> {
    /// Wraps `lifecycle`.
    #[must_use]
    pub fn new(lifecycle: Lifecycle<S>, options: HostedLifecycleOptions) -> Self {
        let HostedLifecycleOptions {
            shutdown_timeout,
            token,
        } = options;

        Self {
            lifecycle,
            shutdown_timeout,
            token,
        }
    }

    /// Wraps a fresh lifecycle for `service` with default options.
    #[must_use]
    pub fn for_service(service: S) -> Self {
        Self::new(Lifecycle::new(service), HostedLifecycleOptions::default())
    }

    /// The wrapped lifecycle.
    #[must_use]
    pub const fn lifecycle(&self) -> &Lifecycle<S> {
        &self.lifecycle
    }
}

#[async_trait]
impl<S: AsyncService> Bootable for HostedLifecycle<S> {
    type Error = Error<S::Error>;

    fn bootable_name(&self) -> &str {
        self.lifecycle.name()
    }

    async fn start(&self) -> Result<(), Self::Error> {
        let service = self.lifecycle.name();
        debug!(%service, "booting");

        let outcome = self.lifecycle.start_and_wait(self.token.clone()).await?;

        if !outcome.is_successful() {
            return Err(Error::Startup(outcome));
        }

        info!(%service, "booted");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        let service = self.lifecycle.name();

        match self.lifecycle.request_stop() {
            StopRequest::Signaled => info!(%service, "shutting down..."),
            StopRequest::AlreadyStopping => debug!(%service, "already shutting down"),
            StopRequest::NotStarted | StopRequest::NothingToStop => {
                debug!(%service, "nothing to shut down");
            }
        }

        if let Ok(res) =
            tokio::time::timeout(self.shutdown_timeout, self.lifecycle.wait_until_stopped()).await
        {
            res?;
            info!(%service, "shutdown");
            Ok(())
        } else {
            warn!(%service, timeout = ?self.shutdown_timeout, "gave up waiting for shutdown");
            Err(Error::ShutdownTimeout(self.shutdown_timeout))
        }
    }

    async fn wait(&self) {
        let _ = self.lifecycle.wait_until_stopped().await;
    }
}
