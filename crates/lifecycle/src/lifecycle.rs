use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::completion::Completion;
use crate::error::AggregateError;
use crate::token::linked_token;
use crate::{
    AsyncService, Error, LifecycleObserver, LifecycleState, ServiceError, SetupOutcome,
    StopRequest, TracingObserver,
};

type RunResult<E> = Result<(), Error<E>>;

/// Drives an [`AsyncService`] through setup, execute and teardown.
///
/// A lifecycle runs at most once. It is a cheap handle: clones share the same
/// state, so any task can observe progress, wait on the completion signals or
/// request a stop while another task drives the run.
pub struct Lifecycle<S: AsyncService> {
    inner: Arc<Inner<S>>,
}

struct Inner<S: AsyncService> {
    service: S,
    observer: Arc<dyn LifecycleObserver>,
    state: Mutex<LifecycleState>,
    disposed: AtomicBool,
    stop_token: CancellationToken,
    done_token: CancellationToken,
    abandoned: CancellationToken,
    started: Completion<SetupOutcome>,
    stopped: Completion<RunResult<S::Error>>,
}

/// Result of the setup phase together with the captured setup error, if any.
type SetupResult<E> = (SetupOutcome, Option<Arc<E>>);

impl<S: AsyncService> Clone for Lifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: AsyncService> fmt::Debug for Lifecycle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("service", &self.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<S: AsyncService> Lifecycle<S> {
    /// Creates a lifecycle that reports events through [`TracingObserver`].
    #[must_use]
    pub fn new(service: S) -> Self {
        Self::with_observer(service, Arc::new(TracingObserver))
    }

    /// Creates a lifecycle that reports events to `observer`.
    #[must_use]
    pub fn with_observer(service: S, observer: Arc<dyn LifecycleObserver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                observer,
                state: Mutex::new(LifecycleState::Created),
                disposed: AtomicBool::new(false),
                stop_token: CancellationToken::new(),
                done_token: CancellationToken::new(),
                abandoned: CancellationToken::new(),
                started: Completion::new(),
                stopped: Completion::new(),
            }),
        }
    }

    /// The service's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.service.name()
    }

    /// The driven service.
    #[must_use]
    pub fn service(&self) -> &S {
        &self.inner.service
    }

    /// The current state. Reports [`LifecycleState::Disposed`] as soon as
    /// disposal has begun.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.state()
    }

    /// Whether a stop has been signaled to a starting or running service.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.inner.stop_token.is_cancelled()
    }

    /// A token that is cancelled once execution has ended, before teardown
    /// runs, or once the run ends without executing.
    #[must_use]
    pub fn execution_done(&self) -> CancellationToken {
        self.inner.done_token.child_token()
    }

    /// Runs the service to completion on the calling task.
    ///
    /// Setup failures, execute failures and teardown failures are returned
    /// here. Cancellation through `token` or [`Self::request_stop`] ends the
    /// run without an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] or [`Error::Disposed`] if the
    /// lifecycle cannot be run, and the hook error otherwise.
    pub async fn run(&self, token: CancellationToken) -> RunResult<S::Error> {
        self.inner.claim_run()?;
        self.inner.clone().drive(false, token).await
    }

    /// Starts the service on a background task and returns immediately.
    ///
    /// Failures of a background run are reported through
    /// [`Self::wait_until_started`], [`Self::wait_until_stopped`] and the
    /// observer. The returned handle only yields an error if a critical
    /// error escaped the run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] or [`Error::Disposed`] if the
    /// lifecycle cannot be started.
    pub fn start(
        &self,
        token: CancellationToken,
    ) -> Result<JoinHandle<RunResult<S::Error>>, Error<S::Error>> {
        self.inner.claim_run()?;
        Ok(tokio::spawn(self.inner.clone().drive(true, token)))
    }

    /// Starts the service in the background and waits for setup to finish.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the lifecycle cannot be started, or the
    /// critical error that ended the run before setup finished.
    pub async fn start_and_wait(
        &self,
        token: CancellationToken,
    ) -> Result<SetupOutcome, Error<S::Error>> {
        let mut handle = self.start(token)?;

        tokio::select! {
            biased;
            outcome = self.wait_until_started() => Ok(outcome),
            res = &mut handle => match res {
                Ok(Err(e)) => Err(e),
                Ok(Ok(())) => Ok(self.wait_until_started().await),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => Ok(self.inner.started.get().unwrap_or(SetupOutcome::NotStarted)),
            },
        }
    }

    /// Asks the service to stop. Never blocks.
    pub fn request_stop(&self) -> StopRequest {
        self.inner.request_stop()
    }

    /// Requests a stop and waits for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns the execute or teardown failure of the run, if any.
    pub async fn stop_and_wait(&self) -> RunResult<S::Error> {
        self.request_stop();
        self.wait_until_stopped().await
    }

    /// Waits for the setup phase to resolve.
    pub async fn wait_until_started(&self) -> SetupOutcome {
        self.inner.started.wait().await
    }

    /// Waits for the run to finish, including teardown.
    ///
    /// # Errors
    ///
    /// Returns the execute or teardown failure of the run, if any.
    pub async fn wait_until_stopped(&self) -> RunResult<S::Error> {
        self.inner.stopped.wait().await
    }

    /// Stops the service if needed, waits for it, then releases its resources.
    ///
    /// Only the first call does anything; later and concurrent calls return
    /// immediately.
    pub async fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let name = inner.service.name();

        let previous = {
            let mut state = inner.state.lock();
            let previous = *state;
            if previous == LifecycleState::Created {
                inner.transition(&mut state, LifecycleState::Disposed);
                inner.started.complete(SetupOutcome::NotStarted);
                inner.stopped.complete(Ok(()));
                inner.done_token.cancel();
            }
            previous
        };

        if previous != LifecycleState::Created {
            match inner.request_stop() {
                StopRequest::Signaled | StopRequest::AlreadyStopping => {
                    debug!(service = %name, "waiting for service to stop before disposal");
                    tokio::select! {
                        _ = inner.stopped.wait() => {}
                        () = inner.abandoned.cancelled() => {
                            debug!(service = %name, "run was abandoned, disposing anyway");
                        }
                    }
                }
                StopRequest::NotStarted | StopRequest::NothingToStop => {}
            }
            inner.set_state(LifecycleState::Disposed);
        }

        inner.service.release_resources().await;

        inner.stop_token.cancel();
        inner.done_token.cancel();
        inner.observer.disposed(name);
    }

    /// Blocks the current thread until [`Self::dispose`] completes.
    ///
    /// Must not be called from a single-threaded runtime that also drives
    /// the run: the run can never finish and this call never returns.
    pub fn dispose_blocking(&self) {
        futures::executor::block_on(self.dispose());
    }
}

impl<S: AsyncService> Inner<S> {
    fn state(&self) -> LifecycleState {
        let state = self.state.lock();
        if self.disposed.load(Ordering::Acquire) {
            LifecycleState::Disposed
        } else {
            *state
        }
    }

    /// Applies a forward transition with the lock held. Backward moves and
    /// repeats are ignored.
    fn transition(&self, state: &mut LifecycleState, new: LifecycleState) {
        if new <= *state {
            return;
        }

        let old = *state;
        *state = new;
        self.observer.state_changed(self.service.name(), old, new);
    }

    fn set_state(&self, new: LifecycleState) {
        let mut state = self.state.lock();
        self.transition(&mut state, new);
    }

    fn claim_run(&self) -> RunResult<S::Error> {
        let mut state = self.state.lock();

        if self.disposed.load(Ordering::Acquire) {
            return Err(Error::Disposed);
        }

        if *state != LifecycleState::Created {
            return Err(Error::AlreadyStarted);
        }

        self.transition(&mut state, LifecycleState::Starting);
        Ok(())
    }

    fn request_stop(&self) -> StopRequest {
        let mut state = self.state.lock();

        match *state {
            LifecycleState::Created => {
                self.transition(&mut state, LifecycleState::Stopped);
                self.started.complete(SetupOutcome::NotStarted);
                self.stopped.complete(Ok(()));
                self.done_token.cancel();
                StopRequest::NotStarted
            }
            LifecycleState::Starting | LifecycleState::Running => {
                if self.stop_token.is_cancelled() {
                    return StopRequest::AlreadyStopping;
                }
                self.stop_token.cancel();
                self.observer.stop_requested(self.service.name());
                StopRequest::Signaled
            }
            LifecycleState::Stopping => StopRequest::AlreadyStopping,
            LifecycleState::Stopped | LifecycleState::Disposed => StopRequest::NothingToStop,
        }
    }

    /// Whether the run has been cancelled. Checks the stop token directly,
    /// since the relay into the linked token may not have run yet.
    fn is_canceled(&self, token: &CancellationToken) -> bool {
        token.is_cancelled() || self.stop_token.is_cancelled()
    }

    async fn drive(
        self: Arc<Self>,
        background: bool,
        caller: CancellationToken,
    ) -> RunResult<S::Error> {
        let res = self.run_phases(background, &caller).await;

        // The signals stay unresolved; this only releases a pending dispose.
        if matches!(res, Err(Error::Critical(_))) {
            self.abandoned.cancel();
        }

        res
    }

    async fn run_phases(
        &self,
        background: bool,
        caller: &CancellationToken,
    ) -> RunResult<S::Error> {
        let (token, _link) = linked_token(caller, &self.stop_token);
        let name = self.service.name();

        let (outcome, setup_error) = self.setup(&token).await?;

        if !outcome.is_successful() {
            {
                let mut state = self.state.lock();
                self.transition(&mut state, LifecycleState::Stopped);
            }
            self.started.complete(outcome);
            self.stopped.complete(Ok(()));
            self.done_token.cancel();

            return match setup_error {
                Some(e) if !background => Err(Error::Setup(e)),
                _ => Ok(()),
            };
        }

        self.set_state(LifecycleState::Running);
        self.started.complete(SetupOutcome::Successful);

        let execute_error = if self.is_canceled(&token) {
            // Setup ignored the token; don't start work that is already cancelled.
            self.observer.execute_canceled(name);
            None
        } else {
            self.execute(&token).await?
        };

        self.done_token.cancel();
        self.set_state(LifecycleState::Stopping);

        let teardown_error = self.teardown().await?;

        self.set_state(LifecycleState::Stopped);

        let result = match (execute_error, teardown_error) {
            (Some(execute), Some(teardown)) => Err(Error::Aggregate(AggregateError::new(vec![
                execute, teardown,
            ]))),
            (Some(execute), None) => Err(Error::Execute(execute)),
            (None, Some(teardown)) => Err(Error::Teardown(teardown)),
            (None, None) => Ok(()),
        };

        self.stopped.complete(result.clone());

        if background { Ok(()) } else { result }
    }

    async fn setup(
        &self,
        token: &CancellationToken,
    ) -> Result<SetupResult<S::Error>, Error<S::Error>> {
        let name = self.service.name();

        if self.is_canceled(token) {
            self.observer.setup_canceled(name);
            return Ok((SetupOutcome::Canceled, None));
        }

        self.observer.before_setup(name);

        match self.service.setup(token.clone()).await {
            Ok(ok) => {
                let outcome = if ok {
                    SetupOutcome::Successful
                } else {
                    SetupOutcome::Unsuccessful
                };
                self.observer.setup_completed(name, outcome);
                Ok((outcome, None))
            }
            Err(e) if e.is_critical() => Err(Error::Critical(Arc::new(e))),
            Err(e) if e.is_cancellation() && self.is_canceled(token) => {
                self.observer.setup_canceled(name);
                Ok((SetupOutcome::Canceled, None))
            }
            Err(e) => {
                self.observer.setup_failed(name, &e);
                Ok((SetupOutcome::Faulted, Some(Arc::new(e))))
            }
        }
    }

    async fn execute(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<Arc<S::Error>>, Error<S::Error>> {
        let name = self.service.name();

        self.observer.before_execute(name);

        match self.service.execute(token.clone()).await {
            Ok(()) => {
                self.observer.execute_completed(name);
                Ok(None)
            }
            Err(e) if e.is_critical() => Err(Error::Critical(Arc::new(e))),
            Err(e) if e.is_cancellation() && self.is_canceled(token) => {
                self.observer.execute_canceled(name);
                Ok(None)
            }
            Err(e) => {
                self.observer.execute_failed(name, &e);
                Ok(Some(Arc::new(e)))
            }
        }
    }

    async fn teardown(&self) -> Result<Option<Arc<S::Error>>, Error<S::Error>> {
        let name = self.service.name();

        self.observer.before_teardown(name);

        match self.service.teardown().await {
            Ok(()) => {
                self.observer.teardown_completed(name);
                Ok(None)
            }
            Err(e) if e.is_critical() => Err(Error::Critical(Arc::new(e))),
            Err(e) => {
                self.observer.teardown_failed(name, &e);
                Ok(Some(Arc::new(e)))
            }
        }
    }
}
