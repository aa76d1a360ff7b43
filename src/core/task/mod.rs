//! # Task Module
//!
//! Launching and polling of long-running server-side jobs.
//!
//! Both the scan and the rebuild follow the same shape: a POST answers a
//! `task_id`, then the client polls the status endpoint at a fixed interval
//! until a terminal status arrives. There is no backoff and no jitter; a
//! bounded, fixed-rate poll matches the server's expected load.

mod transport;

pub use transport::{HttpTransport, TaskTransport};

use crate::protocol::TaskStatus;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Shared cancellation flag for an in-flight workflow.
///
/// Cloneable so a signal handler or UI thread can request cancellation
/// while the workflow is awaiting a poll tick.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Advisory: the task may still complete first.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the flag for a fresh workflow run
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Terminal outcome of a polled task
#[derive(Debug)]
pub enum TerminalOutcome {
    /// The task finished; `result` may carry a payload
    Completed(Option<Value>),
    /// The task was cancelled server-side; partial results may be present
    Cancelled(Option<Value>),
    /// The server reported terminal failure
    Failed { message: Option<String> },
}

/// Polls a task to its terminal status at a fixed interval.
pub struct TaskClient {
    transport: Arc<dyn TaskTransport>,
    poll_interval: Duration,
}

impl TaskClient {
    pub fn new(transport: Arc<dyn TaskTransport>, poll_interval: Duration) -> Self {
        Self {
            transport,
            poll_interval,
        }
    }

    /// Poll `task_id` until it reaches a terminal status.
    ///
    /// `on_progress` receives every progress payload a successful poll
    /// carries, duplicates included; snapshots are last-write-wins.
    ///
    /// A failed poll request is logged and retried on the next tick; only
    /// an explicit `failed` status from the server is terminal failure.
    /// When `cancel` is set, one best-effort cancel request is issued and
    /// polling continues: whichever terminal status arrives first wins, so
    /// a task that completes despite the cancel still yields its results.
    ///
    /// Returning from this function is what stops the poll timer; every
    /// caller path (terminal status, cancellation, workflow drop) ends
    /// here.
    pub async fn poll<F>(&self, task_id: &str, cancel: &CancelFlag, mut on_progress: F) -> TerminalOutcome
    where
        F: FnMut(&Value),
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cancel_requested = false;

        loop {
            ticker.tick().await;

            if cancel.is_set() && !cancel_requested {
                cancel_requested = true;
                self.request_cancel(task_id).await;
            }

            let envelope = match self.transport.status(task_id).await {
                Ok(envelope) => envelope,
                Err(error) => {
                    // Transport hiccups are retried on the next tick and
                    // never surfaced to the operator
                    tracing::debug!(%task_id, %error, "poll request failed, retrying");
                    continue;
                }
            };

            if let Some(progress) = envelope.progress.as_ref() {
                on_progress(progress);
            }

            match envelope.status {
                TaskStatus::Running => {}
                TaskStatus::Completed => return TerminalOutcome::Completed(envelope.result),
                TaskStatus::Cancelled => return TerminalOutcome::Cancelled(envelope.result),
                TaskStatus::Failed => {
                    return TerminalOutcome::Failed {
                        message: envelope.error,
                    }
                }
            }
        }
    }

    /// Best-effort cancel: a failure to cancel server-side is logged and
    /// otherwise ignored.
    pub async fn request_cancel(&self, task_id: &str) {
        if let Err(error) = self.transport.cancel(task_id).await {
            tracing::warn!(%task_id, %error, "cancel request failed, continuing");
        }
    }
}

/// Scripted transport for unit tests across the core modules.
#[cfg(test)]
pub(crate) mod testing {
    use super::TaskTransport;
    use crate::error::TransportError;
    use crate::protocol::{RebuildRequest, ScanRequest, StatusEnvelope, TaskHandle};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers status calls from a fixed queue of envelopes; once the queue
    /// runs dry, keeps answering `completed`.
    pub(crate) struct ScriptedTransport {
        envelopes: Mutex<VecDeque<Result<StatusEnvelope, TransportError>>>,
        pub(crate) scan_launches: AtomicUsize,
        pub(crate) rebuild_launches: AtomicUsize,
        pub(crate) cancels: AtomicUsize,
        pub(crate) last_scan_request: Mutex<Option<serde_json::Value>>,
        pub(crate) last_rebuild_request: Mutex<Option<serde_json::Value>>,
        fail_launches: bool,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<StatusEnvelope, TransportError>>) -> Self {
            Self {
                envelopes: Mutex::new(script.into()),
                scan_launches: AtomicUsize::new(0),
                rebuild_launches: AtomicUsize::new(0),
                cancels: AtomicUsize::new(0),
                last_scan_request: Mutex::new(None),
                last_rebuild_request: Mutex::new(None),
                fail_launches: false,
            }
        }

        /// A transport whose launch endpoints answer HTTP 500
        pub(crate) fn failing_launches() -> Self {
            let mut transport = Self::new(Vec::new());
            transport.fail_launches = true;
            transport
        }

        pub(crate) fn envelope(
            value: serde_json::Value,
        ) -> Result<StatusEnvelope, TransportError> {
            Ok(serde_json::from_value(value).unwrap())
        }

        pub(crate) fn network_error() -> Result<StatusEnvelope, TransportError> {
            Err(TransportError::Status {
                url: "http://test/status/t".to_string(),
                status: 502,
            })
        }
    }

    #[async_trait]
    impl TaskTransport for ScriptedTransport {
        async fn launch_scan(&self, request: &ScanRequest) -> Result<TaskHandle, TransportError> {
            if self.fail_launches {
                return Err(TransportError::Status {
                    url: "http://test/comprehensive-scan".to_string(),
                    status: 500,
                });
            }
            self.scan_launches.fetch_add(1, Ordering::SeqCst);
            *self.last_scan_request.lock().unwrap() =
                Some(serde_json::to_value(request).unwrap());
            Ok(TaskHandle {
                task_id: "scan-task".to_string(),
            })
        }

        async fn launch_rebuild(
            &self,
            request: &RebuildRequest,
        ) -> Result<TaskHandle, TransportError> {
            if self.fail_launches {
                return Err(TransportError::Status {
                    url: "http://test/rebuild-unified".to_string(),
                    status: 500,
                });
            }
            self.rebuild_launches.fetch_add(1, Ordering::SeqCst);
            *self.last_rebuild_request.lock().unwrap() =
                Some(serde_json::to_value(request).unwrap());
            Ok(TaskHandle {
                task_id: "rebuild-task".to_string(),
            })
        }

        async fn status(&self, _task_id: &str) -> Result<StatusEnvelope, TransportError> {
            let mut queue = self.envelopes.lock().unwrap();
            queue
                .pop_front()
                .unwrap_or_else(|| Self::envelope(json!({ "status": "completed" })))
        }

        async fn cancel(&self, _task_id: &str) -> Result<(), TransportError> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use serde_json::json;

    fn client(transport: Arc<ScriptedTransport>) -> TaskClient {
        TaskClient::new(transport, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn poll_resolves_on_completed() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::envelope(json!({ "status": "running" })),
            ScriptedTransport::envelope(json!({ "status": "completed", "result": { "ok": true } })),
        ]));

        let outcome = client(transport)
            .poll("t1", &CancelFlag::new(), |_| {})
            .await;

        match outcome {
            TerminalOutcome::Completed(Some(result)) => assert_eq!(result["ok"], true),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_swallows_transport_errors() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::network_error(),
            ScriptedTransport::network_error(),
            ScriptedTransport::envelope(json!({ "status": "completed" })),
        ]));

        let outcome = client(transport)
            .poll("t1", &CancelFlag::new(), |_| {})
            .await;

        assert!(matches!(outcome, TerminalOutcome::Completed(None)));
    }

    #[tokio::test]
    async fn poll_delivers_every_snapshot_including_duplicates() {
        let snapshot = json!({ "phase": "disk_scan", "percentage": 50.0 });
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::envelope(json!({ "status": "running", "progress": snapshot.clone() })),
            ScriptedTransport::envelope(json!({ "status": "running", "progress": snapshot })),
            ScriptedTransport::envelope(json!({ "status": "completed" })),
        ]));

        let mut seen = 0;
        client(transport)
            .poll("t1", &CancelFlag::new(), |_| seen += 1)
            .await;

        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn failed_status_is_terminal_with_message() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::envelope(
            json!({ "status": "failed", "error": "disk on fire" }),
        )]));

        let outcome = client(transport)
            .poll("t1", &CancelFlag::new(), |_| {})
            .await;

        match outcome {
            TerminalOutcome::Failed { message } => {
                assert_eq!(message.as_deref(), Some("disk on fire"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_is_requested_once_and_completion_still_wins() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::envelope(json!({ "status": "running" })),
            ScriptedTransport::envelope(json!({ "status": "running" })),
            ScriptedTransport::envelope(json!({ "status": "completed", "result": { "done": 3 } })),
        ]));

        let cancel = CancelFlag::new();
        cancel.set();

        let outcome = client(transport.clone()).poll("t1", &cancel, |_| {}).await;

        assert_eq!(transport.cancels.load(Ordering::SeqCst), 1);
        match outcome {
            TerminalOutcome::Completed(Some(result)) => assert_eq!(result["done"], 3),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
