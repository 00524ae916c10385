//! Start/stop profiling of push operations
//!
//! Every push opens exactly one event with [`Profiler::start_profiling`] and
//! closes it with [`Profiler::stop_profiling`], whatever the outcome.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Handle returned by `start_profiling`
#[derive(Debug, Clone)]
pub struct ProfilingEvent {
    id: Uuid,
    label: String,
    started_at: Instant,
}

impl ProfilingEvent {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Result descriptor reported when an event stops
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub error: bool,
    pub error_message: Option<String>,
}

impl PushOutcome {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            error_message: Some(message.into()),
        }
    }
}

pub trait Profiler: Send + Sync {
    fn start_profiling(&self, label: &str) -> ProfilingEvent;

    fn stop_profiling(&self, event: ProfilingEvent, outcome: &PushOutcome);
}

/// Reports each push as a tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProfiler;

impl Profiler for TracingProfiler {
    fn start_profiling(&self, label: &str) -> ProfilingEvent {
        ProfilingEvent::start(label)
    }

    fn stop_profiling(&self, event: ProfilingEvent, outcome: &PushOutcome) {
        let elapsed_ms = event.elapsed().as_millis() as u64;

        match &outcome.error_message {
            Some(message) if outcome.error => warn!(
                event_id = %event.id,
                label = %event.label,
                elapsed_ms,
                error = %message,
                "Push notification failed"
            ),
            _ => info!(
                event_id = %event.id,
                label = %event.label,
                elapsed_ms,
                "Push notification sent"
            ),
        }
    }
}

/// One finished push as seen by [`RecordingProfiler`]
#[derive(Debug, Clone)]
pub struct ProfiledPush {
    pub id: Uuid,
    pub label: String,
    pub duration: Duration,
    pub outcome: PushOutcome,
}

#[derive(Debug, Clone)]
pub enum ProfilerCall {
    Started { id: Uuid, label: String },
    Stopped(ProfiledPush),
}

/// In-memory collector, the data source for profiler panels and tests
#[derive(Debug, Default)]
pub struct RecordingProfiler {
    calls: Mutex<Vec<ProfilerCall>>,
}

impl RecordingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every start and stop, in call order
    pub fn calls(&self) -> Vec<ProfilerCall> {
        self.calls.lock().clone()
    }

    pub fn completed(&self) -> Vec<ProfiledPush> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ProfilerCall::Stopped(push) => Some(push.clone()),
                ProfilerCall::Started { .. } => None,
            })
            .collect()
    }

    pub fn started_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, ProfilerCall::Started { .. }))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.completed().iter().filter(|push| push.outcome.error).count()
    }

    pub fn total_duration(&self) -> Duration {
        self.completed().iter().map(|push| push.duration).sum()
    }
}

impl Profiler for RecordingProfiler {
    fn start_profiling(&self, label: &str) -> ProfilingEvent {
        let event = ProfilingEvent::start(label);
        self.calls.lock().push(ProfilerCall::Started {
            id: event.id,
            label: event.label.clone(),
        });
        event
    }

    fn stop_profiling(&self, event: ProfilingEvent, outcome: &PushOutcome) {
        let duration = event.elapsed();
        self.calls.lock().push(ProfilerCall::Stopped(ProfiledPush {
            id: event.id,
            label: event.label,
            duration,
            outcome: outcome.clone(),
        }));
    }
}
