// src/engine/interrupt.rs

//! Process-wide cancellation flag.
//!
//! Modelled as an explicit shared atomic rather than a signal-handler
//! global: every scheduling and retry loop takes the flag as an input and
//! consults it before starting new work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Cloneable cancellation flag. Set once, never cleared.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wire OS termination signals to the flag.
///
/// Ctrl-C plus SIGTERM/SIGHUP on unix — an operator closing the
/// orchestrator's own terminal must stop the run the same way Ctrl-C does.
pub fn install_signal_handlers(flag: &InterruptFlag) {
    {
        let flag = flag.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("interrupt signal received; stopping after the current task");
            flag.set();
        });
    }

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        for kind in [SignalKind::terminate(), SignalKind::hangup()] {
            let flag = flag.clone();
            tokio::spawn(async move {
                let Ok(mut stream) = signal(kind) else {
                    return;
                };
                if stream.recv().await.is_some() {
                    warn!("termination signal received; stopping after the current task");
                    flag.set();
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset_and_latches() {
        let flag = InterruptFlag::new();
        assert!(!flag.is_set());

        let clone = flag.clone();
        clone.set();
        assert!(flag.is_set());
    }
}
