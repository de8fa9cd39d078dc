//! Cooperative run cancellation.
//!
//! The executor checks the signal before starting each work unit. A
//! collaborator call already in flight is not interrupted.

use tokio::sync::watch;

/// Sender half: request cancellation of every run holding a matching signal.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiver half, checked between stages.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A connected canceller/signal pair.
    pub fn pair() -> (Canceller, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Canceller { tx }, CancelSignal { rx })
    }

    /// A signal that never fires.
    pub fn never() -> CancelSignal {
        Self::pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_observes_cancel() {
        let (canceller, signal) = CancelSignal::pair();
        let copy = signal.clone();
        assert!(!signal.is_cancelled());
        canceller.cancel();
        assert!(signal.is_cancelled());
        assert!(copy.is_cancelled());
    }

    #[test]
    fn test_never_stays_clear() {
        assert!(!CancelSignal::never().is_cancelled());
    }
}
