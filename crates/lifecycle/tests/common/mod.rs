//! Shared fixtures for lifecycle tests.
#![allow(dead_code)]

use std::error::Error as StdError;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use steward_lifecycle::{
    AsyncService, Lifecycle, LifecycleObserver, LifecycleState, ServiceError, SetupOutcome,
};
use thiserror::Error;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TestError {
    #[error("{0}")]
    Fault(&'static str),

    #[error("canceled")]
    Canceled,

    #[error("critical: {0}")]
    Critical(&'static str),
}

impl ServiceError for TestError {
    fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Critical(_))
    }
}

#[derive(Clone, Debug)]
pub enum Setup {
    Succeed,
    Refuse,
    Fail(&'static str),
    Critical(&'static str),
    /// Waits for cancellation and reports it.
    WaitForCancel,
    /// Waits for cancellation but then claims success anyway.
    IgnoreCancel,
}

#[derive(Clone, Debug)]
pub enum Execute {
    Complete,
    Fail(&'static str),
    Critical(&'static str),
    WaitForCancel,
    /// Waits for cancellation, then fails critically.
    CriticalOnCancel(&'static str),
}

#[derive(Clone, Debug)]
pub enum Teardown {
    Complete,
    Fail(&'static str),
    WaitFor(Arc<Notify>),
}

#[derive(Debug)]
pub struct TestService {
    setup: Setup,
    execute: Execute,
    teardown: Teardown,
    setup_calls: AtomicUsize,
    execute_calls: AtomicUsize,
    teardown_calls: AtomicUsize,
    release_calls: AtomicUsize,
}

impl TestService {
    pub fn new(setup: Setup, execute: Execute, teardown: Teardown) -> Self {
        Self {
            setup,
            execute,
            teardown,
            setup_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
            teardown_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
        }
    }

    pub fn happy() -> Self {
        Self::new(Setup::Succeed, Execute::Complete, Teardown::Complete)
    }

    pub fn long_running() -> Self {
        Self::new(Setup::Succeed, Execute::WaitForCancel, Teardown::Complete)
    }

    pub fn setup_calls(&self) -> usize {
        self.setup_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn teardown_calls(&self) -> usize {
        self.teardown_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AsyncService for TestService {
    type Error = TestError;

    fn name(&self) -> &str {
        "test-service"
    }

    async fn setup(&self, token: CancellationToken) -> Result<bool, Self::Error> {
        self.setup_calls.fetch_add(1, Ordering::SeqCst);

        match self.setup {
            Setup::Succeed => Ok(true),
            Setup::Refuse => Ok(false),
            Setup::Fail(msg) => Err(TestError::Fault(msg)),
            Setup::Critical(msg) => Err(TestError::Critical(msg)),
            Setup::WaitForCancel => {
                token.cancelled().await;
                Err(TestError::Canceled)
            }
            Setup::IgnoreCancel => {
                token.cancelled().await;
                Ok(true)
            }
        }
    }

    async fn execute(&self, token: CancellationToken) -> Result<(), Self::Error> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);

        match self.execute {
            Execute::Complete => Ok(()),
            Execute::Fail(msg) => Err(TestError::Fault(msg)),
            Execute::Critical(msg) => Err(TestError::Critical(msg)),
            Execute::WaitForCancel => {
                token.cancelled().await;
                Err(TestError::Canceled)
            }
            Execute::CriticalOnCancel(msg) => {
                token.cancelled().await;
                Err(TestError::Critical(msg))
            }
        }
    }

    async fn teardown(&self) -> Result<(), Self::Error> {
        self.teardown_calls.fetch_add(1, Ordering::SeqCst);

        match &self.teardown {
            Teardown::Complete => Ok(()),
            Teardown::Fail(msg) => Err(TestError::Fault(msg)),
            Teardown::WaitFor(gate) => {
                gate.notified().await;
                Ok(())
            }
        }
    }

    async fn release_resources(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    StateChanged(LifecycleState, LifecycleState),
    BeforeSetup,
    SetupCompleted(SetupOutcome),
    SetupCanceled,
    SetupFailed(String),
    BeforeExecute,
    ExecuteCompleted,
    ExecuteCanceled,
    ExecuteFailed(String),
    BeforeTeardown,
    TeardownCompleted,
    TeardownFailed(String),
    StopRequested,
    Disposed,
}

/// Observer that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// Every state the lifecycle entered, in order, starting with `Created`.
    pub fn states(&self) -> Vec<LifecycleState> {
        let mut states = vec![LifecycleState::Created];
        states.extend(self.events.lock().iter().filter_map(|e| match e {
            Event::StateChanged(_, new) => Some(*new),
            _ => None,
        }));
        states
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl LifecycleObserver for RecordingObserver {
    fn state_changed(&self, _service: &str, old: LifecycleState, new: LifecycleState) {
        self.push(Event::StateChanged(old, new));
    }

    fn before_setup(&self, _service: &str) {
        self.push(Event::BeforeSetup);
    }

    fn setup_completed(&self, _service: &str, outcome: SetupOutcome) {
        self.push(Event::SetupCompleted(outcome));
    }

    fn setup_canceled(&self, _service: &str) {
        self.push(Event::SetupCanceled);
    }

    fn setup_failed(&self, _service: &str, error: &(dyn StdError + 'static)) {
        self.push(Event::SetupFailed(error.to_string()));
    }

    fn before_execute(&self, _service: &str) {
        self.push(Event::BeforeExecute);
    }

    fn execute_completed(&self, _service: &str) {
        self.push(Event::ExecuteCompleted);
    }

    fn execute_canceled(&self, _service: &str) {
        self.push(Event::ExecuteCanceled);
    }

    fn execute_failed(&self, _service: &str, error: &(dyn StdError + 'static)) {
        self.push(Event::ExecuteFailed(error.to_string()));
    }

    fn before_teardown(&self, _service: &str) {
        self.push(Event::BeforeTeardown);
    }

    fn teardown_completed(&self, _service: &str) {
        self.push(Event::TeardownCompleted);
    }

    fn teardown_failed(&self, _service: &str, error: &(dyn StdError + 'static)) {
        self.push(Event::TeardownFailed(error.to_string()));
    }

    fn stop_requested(&self, _service: &str) {
        self.push(Event::StopRequested);
    }

    fn disposed(&self, _service: &str) {
        self.push(Event::Disposed);
    }
}

pub fn observed(service: TestService) -> (Lifecycle<TestService>, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let lifecycle = Lifecycle::with_observer(service, observer.clone());
    (lifecycle, observer)
}

/// Polls until `f` holds, failing the test after [`WAIT`].
pub async fn eventually(mut f: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !f() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn assert_monotonic(states: &[LifecycleState]) {
    for pair in states.windows(2) {
        assert!(
            pair[0] < pair[1],
            "state moved from {} to {}",
            pair[0],
            pair[1]
        );
    }
}
