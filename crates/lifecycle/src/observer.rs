//! Hooks invoked at fixed points of a lifecycle.

use std::error::Error as StdError;

use tracing::{debug, error, info, warn};

use crate::{LifecycleState, SetupOutcome};

/// Receives lifecycle events.
///
/// Every method has an empty default. Implementations must be cheap and
/// must not panic: some hooks run while the state lock is held.
pub trait LifecycleObserver: Send + Sync + 'static {
    /// The state moved from `old` to `new`.
    fn state_changed(&self, _service: &str, _old: LifecycleState, _new: LifecycleState) {}

    /// Setup is about to run.
    fn before_setup(&self, _service: &str) {}

    /// Setup returned, successfully or not.
    fn setup_completed(&self, _service: &str, _outcome: SetupOutcome) {}

    /// Setup was cancelled, or skipped because cancellation was already requested.
    fn setup_canceled(&self, _service: &str) {}

    /// Setup returned an error.
    fn setup_failed(&self, _service: &str, _error: &(dyn StdError + 'static)) {}

    /// Execute is about to run.
    fn before_execute(&self, _service: &str) {}

    /// Execute returned without error.
    fn execute_completed(&self, _service: &str) {}

    /// Execute exited because of cancellation.
    fn execute_canceled(&self, _service: &str) {}

    /// Execute returned an error.
    fn execute_failed(&self, _service: &str, _error: &(dyn StdError + 'static)) {}

    /// Teardown is about to run.
    fn before_teardown(&self, _service: &str) {}

    /// Teardown returned without error.
    fn teardown_completed(&self, _service: &str) {}

    /// Teardown returned an error.
    fn teardown_failed(&self, _service: &str, _error: &(dyn StdError + 'static)) {}

    /// A stop was signaled to a starting or running service.
    fn stop_requested(&self, _service: &str) {}

    /// Disposal finished and resources were released.
    fn disposed(&self, _service: &str) {}
}

/// Observer that emits `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
    fn state_changed(&self, service: &str, old: LifecycleState, new: LifecycleState) {
        debug!(%service, %old, %new, "lifecycle state changed");
    }

    fn before_setup(&self, service: &str) {
        debug!(%service, "setting up");
    }

    fn setup_completed(&self, service: &str, outcome: SetupOutcome) {
        if outcome.is_successful() {
            info!(%service, "setup completed");
        } else {
            warn!(%service, %outcome, "setup did not succeed");
        }
    }

    fn setup_canceled(&self, service: &str) {
        info!(%service, "setup canceled");
    }

    fn setup_failed(&self, service: &str, error: &(dyn StdError + 'static)) {
        error!(%service, %error, "setup failed");
    }

    fn before_execute(&self, service: &str) {
        debug!(%service, "executing");
    }

    fn execute_completed(&self, service: &str) {
        info!(%service, "execution completed");
    }

    fn execute_canceled(&self, service: &str) {
        info!(%service, "execution canceled");
    }

    fn execute_failed(&self, service: &str, error: &(dyn StdError + 'static)) {
        error!(%service, %error, "execution failed");
    }

    fn before_teardown(&self, service: &str) {
        debug!(%service, "tearing down");
    }

    fn teardown_completed(&self, service: &str) {
        debug!(%service, "teardown completed");
    }

    fn teardown_failed(&self, service: &str, error: &(dyn StdError + 'static)) {
        error!(%service, %error, "teardown failed");
    }

    fn stop_requested(&self, service: &str) {
        info!(%service, "stop requested");
    }

    fn disposed(&self, service: &str) {
        debug!(%service, "disposed");
    }
}
