//! Progress notification and structured run logging.
//!
//! Two side channels exist:
//! - [`ProgressObserver`]: human-readable messages for a front end, only sent
//!   when the run's `verbose` option is on.
//! - `tracing` events (`run.started`, `stage.started`, ...), always emitted
//!   inside the run's span and filtered by the subscriber.

use tracing::{info, warn};

/// Receives human-readable progress messages during a run.
///
/// Observers are purely diagnostic and cannot influence control flow.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, message: &str);
}

impl<F> ProgressObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, message: &str) {
        self(message)
    }
}

/// Observer that discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _message: &str) {}
}

pub fn emit_run_started(run_id: &str, topic: &str, units: usize, model: &str) {
    info!(event = "run.started", run_id = %run_id, topic = %topic, units = units, model = %model);
}

pub fn emit_stage_started(position: usize, unit: &str, role: &str) {
    info!(event = "stage.started", position = position, unit = %unit, role = %role);
}

pub fn emit_stage_completed(unit: &str, duration_ms: u64, output_chars: usize) {
    info!(
        event = "stage.completed",
        unit = %unit,
        duration_ms = duration_ms,
        output_chars = output_chars,
    );
}

pub fn emit_stage_failed(unit: &str, reason: &str) {
    warn!(event = "stage.failed", unit = %unit, reason = %reason);
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, completed: usize, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        completed_stages = completed,
        success = success,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_an_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = |msg: &str| seen.lock().unwrap().push(msg.to_string());
        observer.on_progress("hello");
        assert_eq!(seen.lock().unwrap().as_slice(), ["hello".to_string()]);
    }

    #[test]
    fn test_emitters_do_not_panic_without_subscriber() {
        emit_run_started("run-1", "AI", 2, "gpt-4");
        emit_stage_started(0, "research", "Analyst");
        emit_stage_completed("research", 12, 340);
        emit_stage_failed("writing", "provider unavailable: down");
        emit_run_finished("run-1", 20, 1, false);
    }
}
