//! Shared test support: a scripted transport that answers the polling
//! protocol from a fixed queue of envelopes, no network involved.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thumbnail_mender::core::task::TaskTransport;
use thumbnail_mender::core::EngineConfig;
use thumbnail_mender::error::TransportError;
use thumbnail_mender::events::{Event, EventChannel, EventReceiver};
use thumbnail_mender::protocol::{RebuildRequest, ScanRequest, StatusEnvelope, TaskHandle};

/// Answers status calls from a fixed queue; once the queue runs dry it
/// keeps answering a bare `completed`.
pub struct ScriptedTransport {
    envelopes: Mutex<VecDeque<StatusEnvelope>>,
    pub scan_launches: AtomicUsize,
    pub rebuild_launches: AtomicUsize,
    pub cancels: AtomicUsize,
    pub last_rebuild_request: Mutex<Option<serde_json::Value>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<serde_json::Value>) -> Arc<Self> {
        let envelopes = script
            .into_iter()
            .map(|value| serde_json::from_value(value).expect("valid envelope"))
            .collect();
        Arc::new(Self {
            envelopes: Mutex::new(envelopes),
            scan_launches: AtomicUsize::new(0),
            rebuild_launches: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            last_rebuild_request: Mutex::new(None),
        })
    }

    pub fn scan_count(&self) -> usize {
        self.scan_launches.load(Ordering::SeqCst)
    }

    pub fn rebuild_count(&self) -> usize {
        self.rebuild_launches.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskTransport for ScriptedTransport {
    async fn launch_scan(&self, _request: &ScanRequest) -> Result<TaskHandle, TransportError> {
        self.scan_launches.fetch_add(1, Ordering::SeqCst);
        Ok(TaskHandle {
            task_id: "scan-task".to_string(),
        })
    }

    async fn launch_rebuild(
        &self,
        request: &RebuildRequest,
    ) -> Result<TaskHandle, TransportError> {
        self.rebuild_launches.fetch_add(1, Ordering::SeqCst);
        *self.last_rebuild_request.lock().unwrap() =
            Some(serde_json::to_value(request).unwrap());
        Ok(TaskHandle {
            task_id: "rebuild-task".to_string(),
        })
    }

    async fn status(&self, _task_id: &str) -> Result<StatusEnvelope, TransportError> {
        let mut queue = self.envelopes.lock().unwrap();
        Ok(queue
            .pop_front()
            .unwrap_or_else(|| serde_json::from_value(json!({ "status": "completed" })).unwrap()))
    }

    async fn cancel(&self, _task_id: &str) -> Result<(), TransportError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fast engine config for tests; production keeps the 500 ms default.
pub fn test_config() -> EngineConfig {
    EngineConfig::new().poll_interval(Duration::from_millis(1))
}

/// Event channel plus a drain helper for post-run assertions.
pub fn event_channel() -> (thumbnail_mender::events::EventSender, EventReceiver) {
    EventChannel::new()
}

pub fn drain(receiver: &EventReceiver) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// The worked example from the protocol docs: 100 valid, 5 broken links,
/// 3 linkable orphans, 2 missing, no true orphans.
pub fn example_scan_completed() -> serde_json::Value {
    json!({
        "status": "completed",
        "result": {
            "categories": {
                "valid": 100,
                "broken_links": 5,
                "linkable_orphans": 3,
                "missing": 2
            },
            "true_orphans": { "count": 0, "size_bytes": 0, "sample_files": [] },
            "estimated_time_seconds": 12.0,
            "breakdown": { "scan_token": "abc123" }
        }
    })
}
