use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::FlowResult;
use crate::messages;
use crate::submission::lifecycle::{SubmissionLifecycle, SubmissionState, SubmitFailure};

/// Remote call wrapped by a [`SubmissionController`].
#[async_trait]
pub trait SubmitOperation<P: Send + 'static>: Send + Sync {
    async fn submit(&self, payload: P) -> Result<(), SubmitFailure>;
}

/// Host callback closing the flow once a success has been displayed.
pub type CloseHook = Arc<dyn Fn() + Send + Sync>;

pub fn noop_close_hook() -> CloseHook {
    Arc::new(|| {})
}

#[derive(Default)]
struct Shared {
    lifecycle: SubmissionLifecycle,
    disposed: bool,
    closed: bool,
    close_task: Option<JoinHandle<()>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle on a dispatched submit call.
#[derive(Debug)]
pub struct PendingSubmission {
    handle: JoinHandle<SubmissionState>,
}

impl PendingSubmission {
    /// Waits for the remote call and returns the state it left behind.
    pub async fn settled(self) -> FlowResult<SubmissionState> {
        Ok(self.handle.await?)
    }
}

/// Outcome of asking a flow to submit.
#[derive(Debug)]
pub enum SubmitAttempt {
    Dispatched(PendingSubmission),
    /// Client-side validation failed; nothing was sent.
    Invalid,
    /// Final confirmation requested before the last step.
    NotOnLastStep,
    /// A submit is already in flight or has succeeded.
    Ignored,
}

impl SubmitAttempt {
    pub fn into_pending(self) -> Option<PendingSubmission> {
        match self {
            SubmitAttempt::Dispatched(pending) => Some(pending),
            _ => None,
        }
    }
}

/// Generic submission state machine shared by every flow.
///
/// At most one submit call is outstanding at a time. The call runs on the
/// tokio runtime and is never cancelled; once the controller is disposed its
/// result is dropped instead of applied. After a success the close hook fires
/// once, `close_delay` later, unless the controller is disposed first.
pub struct SubmissionController<P: Send + 'static> {
    shared: Arc<Mutex<Shared>>,
    operation: Arc<dyn SubmitOperation<P>>,
    close_delay: Duration,
    on_close: CloseHook,
    generic_error: String,
    flow: &'static str,
}

impl<P: Send + 'static> SubmissionController<P> {
    pub fn new(operation: Arc<dyn SubmitOperation<P>>, close_delay: Duration) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            operation,
            close_delay,
            on_close: noop_close_hook(),
            generic_error: messages::GENERIC_SUBMIT_ERROR.to_string(),
            flow: "flow",
        }
    }

    pub fn with_close_hook(mut self, on_close: CloseHook) -> Self {
        self.on_close = on_close;
        self
    }

    pub fn with_generic_error(mut self, message: impl Into<String>) -> Self {
        self.generic_error = message.into();
        self
    }

    /// Name used in log lines.
    pub fn with_flow_name(mut self, flow: &'static str) -> Self {
        self.flow = flow;
        self
    }

    /// Dispatches `payload` unless a submit is already outstanding, has
    /// succeeded, or the controller is disposed. Must run inside a tokio
    /// runtime.
    pub fn submit(&self, payload: P) -> Option<PendingSubmission> {
        {
            let mut guard = lock(&self.shared);
            if guard.disposed {
                debug!(flow = self.flow, "submit ignored on disposed controller");
                return None;
            }
            if !guard.lifecycle.begin() {
                debug!(
                    flow = self.flow,
                    state = %guard.lifecycle.state(),
                    "submit ignored while busy"
                );
                return None;
            }
        }
        info!(flow = self.flow, "submission dispatched");

        let shared = Arc::clone(&self.shared);
        let operation = Arc::clone(&self.operation);
        let on_close = Arc::clone(&self.on_close);
        let generic_error = self.generic_error.clone();
        let close_delay = self.close_delay;
        let flow = self.flow;

        let handle = tokio::spawn(async move {
            // A panicking operation must still leave the flow retryable.
            let outcome = match tokio::spawn(async move { operation.submit(payload).await }).await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(flow, error = %err, "submit operation aborted");
                    Err(SubmitFailure::unknown())
                }
            };
            let mut guard = lock(&shared);
            if guard.disposed {
                debug!(flow, "discarding submission result for disposed flow");
                return guard.lifecycle.state();
            }
            match outcome {
                Ok(()) => {
                    guard.lifecycle.succeed();
                    info!(flow, "submission succeeded");
                    guard.close_task = Some(schedule_close(
                        Arc::clone(&shared),
                        close_delay,
                        on_close,
                        flow,
                    ));
                }
                Err(failure) => {
                    let message = failure.message(&generic_error);
                    warn!(flow, error = %failure, "submission failed");
                    guard.lifecycle.fail(message);
                }
            }
            guard.lifecycle.state()
        });

        Some(PendingSubmission { handle })
    }

    pub fn state(&self) -> SubmissionState {
        lock(&self.shared).lifecycle.state()
    }

    pub fn error_message(&self) -> Option<String> {
        lock(&self.shared)
            .lifecycle
            .error_message()
            .map(str::to_string)
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    /// Whether the delayed close has fired.
    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.shared).disposed
    }

    pub fn close_delay(&self) -> Duration {
        self.close_delay
    }

    /// Tears the controller down: pending results are discarded and a
    /// scheduled close is cancelled. Idempotent.
    pub fn dispose(&self) {
        let mut guard = lock(&self.shared);
        if guard.disposed {
            return;
        }
        guard.disposed = true;
        if let Some(task) = guard.close_task.take() {
            task.abort();
        }
        debug!(flow = self.flow, "submission controller disposed");
    }
}

impl<P: Send + 'static> Drop for SubmissionController<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn schedule_close(
    shared: Arc<Mutex<Shared>>,
    delay: Duration,
    on_close: CloseHook,
    flow: &'static str,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        {
            let mut guard = lock(&shared);
            if guard.disposed || guard.closed {
                return;
            }
            guard.closed = true;
            guard.close_task = None;
        }
        info!(flow, "closing flow after successful submission");
        on_close();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct Gate {
        calls: AtomicUsize,
        release: Notify,
        fail_with: Option<&'static str>,
    }

    impl Gate {
        fn new(fail_with: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
                fail_with,
            })
        }
    }

    #[async_trait]
    impl SubmitOperation<u32> for Gate {
        async fn submit(&self, _payload: u32) -> Result<(), SubmitFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            match self.fail_with {
                Some(reason) => Err(SubmitFailure::new(reason)),
                None => Ok(()),
            }
        }
    }

    fn controller(gate: &Arc<Gate>, delay: Duration) -> SubmissionController<u32> {
        let operation: Arc<dyn SubmitOperation<u32>> = gate.clone();
        SubmissionController::new(operation, delay)
    }

    fn counter_hook() -> (CloseHook, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&count);
        let hook: CloseHook = Arc::new(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });
        (hook, count)
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let gate = Gate::new(None);
        let controller = controller(&gate, Duration::from_millis(10));

        let pending = controller.submit(1).expect("first submit dispatched");
        assert_eq!(controller.state(), SubmissionState::Submitting);
        assert!(controller.submit(2).is_none());

        gate.release.notify_one();
        assert_eq!(pending.settled().await.unwrap(), SubmissionState::Success);
        assert!(controller.submit(3).is_none());
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_hook_fires_once_after_delay() {
        let gate = Gate::new(None);
        let (hook, closes) = counter_hook();
        let controller = controller(&gate, Duration::from_millis(1500)).with_close_hook(hook);

        let pending = controller.submit(7).unwrap();
        gate.release.notify_one();
        pending.settled().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(controller.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_scheduled_close() {
        let gate = Gate::new(None);
        let (hook, closes) = counter_hook();
        let controller = controller(&gate, Duration::from_secs(3)).with_close_hook(hook);

        let pending = controller.submit(7).unwrap();
        gate.release.notify_one();
        pending.settled().await.unwrap();
        controller.dispose();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn late_result_after_dispose_is_discarded() {
        let gate = Gate::new(Some("network down"));
        let controller = controller(&gate, Duration::from_secs(1));

        let pending = controller.submit(9).unwrap();
        controller.dispose();
        gate.release.notify_one();

        assert_eq!(pending.settled().await.unwrap(), SubmissionState::Submitting);
        assert_eq!(controller.error_message(), None);
        assert!(controller.submit(10).is_none());
    }

    #[tokio::test]
    async fn failure_without_reason_uses_generic_message() {
        struct Opaque;

        #[async_trait]
        impl SubmitOperation<u32> for Opaque {
            async fn submit(&self, _payload: u32) -> Result<(), SubmitFailure> {
                Err(SubmitFailure::unknown())
            }
        }

        let operation: Arc<dyn SubmitOperation<u32>> = Arc::new(Opaque);
        let controller = SubmissionController::new(operation, Duration::from_secs(1))
            .with_generic_error("Beklenmeyen hata");
        let state = controller.submit(1).unwrap().settled().await.unwrap();

        assert_eq!(state, SubmissionState::Error);
        assert_eq!(controller.error_message().as_deref(), Some("Beklenmeyen hata"));
    }

    #[tokio::test]
    async fn panicking_operation_settles_as_error() {
        struct Raising;

        #[async_trait]
        impl SubmitOperation<u32> for Raising {
            async fn submit(&self, payload: u32) -> Result<(), SubmitFailure> {
                panic!("transport blew up on {payload}");
            }
        }

        let operation: Arc<dyn SubmitOperation<u32>> = Arc::new(Raising);
        let controller = SubmissionController::new(operation, Duration::from_secs(1));
        let state = controller.submit(1).unwrap().settled().await.unwrap();

        assert_eq!(state, SubmissionState::Error);
        assert_eq!(
            controller.error_message().as_deref(),
            Some(messages::GENERIC_SUBMIT_ERROR)
        );
        assert!(!controller.is_busy());
        assert!(controller.submit(2).is_some());
    }
}
