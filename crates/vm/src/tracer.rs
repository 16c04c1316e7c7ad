use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Cooperative cancellation flag shared between a tracer and an optional
/// deadline timer. The interpreter is never preempted; the tracer polls
/// this between VM steps and truncates its output once set.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that a background timer flips after `deadline` elapses.
    pub fn with_deadline(deadline: Duration) -> Self {
        let token = Self::new();
        let timer = token.clone();
        thread::spawn(move || {
            thread::sleep(deadline);
            timer.cancel();
        });
        token
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// One interpreter step as observed by a tracer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceStep {
    pub pc: u64,
    pub op: String,
    pub gas: u64,
    pub gas_cost: u64,
    pub depth: u16,
}

/// Observes interpreter steps. Implementations decide what to record;
/// they must stay cheap, they run inline with execution.
pub trait Tracer {
    fn capture_step(&mut self, step: TraceStep);

    /// Polled by the interpreter between steps. A `true` here means the
    /// tracer no longer wants steps; execution itself continues.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Records every step into a structured list, honoring a cancel token by
/// truncating (further steps are dropped, the `truncated` flag is set).
#[derive(Default)]
pub struct StructTracer {
    steps: Vec<TraceStep>,
    cancel: Option<CancelToken>,
    truncated: bool,
}

impl StructTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self {
            cancel: Some(cancel),
            ..Self::default()
        }
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<TraceStep> {
        self.steps
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl Tracer for StructTracer {
    fn capture_step(&mut self, step: TraceStep) {
        if self.is_cancelled() {
            self.truncated = true;
            return;
        }
        self.steps.push(step);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(pc: u64) -> TraceStep {
        TraceStep {
            pc,
            op: "PUSH1".to_owned(),
            gas: 100,
            gas_cost: 3,
            depth: 1,
        }
    }

    #[test]
    fn cancellation_truncates_but_does_not_fail() {
        let token = CancelToken::new();
        let mut tracer = StructTracer::with_cancel(token.clone());
        tracer.capture_step(step(0));
        token.cancel();
        tracer.capture_step(step(2));
        assert_eq!(tracer.steps().len(), 1);
        assert!(tracer.truncated());
    }

    #[test]
    fn deadline_token_flips_after_the_timeout() {
        let token = CancelToken::with_deadline(Duration::from_millis(10));
        assert!(!token.is_cancelled());
        thread::sleep(Duration::from_millis(50));
        assert!(token.is_cancelled());
    }
}
