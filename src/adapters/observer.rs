use crate::domain::ports::{BatchObserver, BatchState, StepEvent, StepOutcome};
use std::sync::Mutex;

/// Emits each step as a structured tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_step(&self, event: &StepEvent) {
        match &event.outcome {
            StepOutcome::Succeeded(id) => tracing::info!(
                group_index = ?event.group_index,
                step = ?event.step,
                id = id.as_deref().unwrap_or("-"),
                "step succeeded"
            ),
            StepOutcome::Failed(message) => tracing::warn!(
                group_index = ?event.group_index,
                step = ?event.step,
                error = %message,
                "step failed"
            ),
        }
    }

    fn on_state(&self, state: BatchState) {
        tracing::debug!(state = ?state, "batch state");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {
    fn on_step(&self, _event: &StepEvent) {}
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StepEvent>>,
    states: Mutex<Vec<BatchState>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StepEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn states(&self) -> Vec<BatchState> {
        self.states.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<StepEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event.outcome, StepOutcome::Failed(_)))
            .collect()
    }
}

impl BatchObserver for RecordingObserver {
    fn on_step(&self, event: &StepEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn on_state(&self, state: BatchState) {
        if let Ok(mut states) = self.states.lock() {
            states.push(state);
        }
    }
}

/// Lets a borrowed observer be handed to the orchestrator.
impl<O: BatchObserver> BatchObserver for &O {
    fn on_step(&self, event: &StepEvent) {
        (**self).on_step(event)
    }

    fn on_state(&self, state: BatchState) {
        (**self).on_state(state)
    }
}
