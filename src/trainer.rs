use tracing::warn;

use crate::session::{Intent, RoundStatus, Session, SessionSnapshot, TickOutcome};
use crate::signal::CompletionSignal;
use crate::wake_lock::{Visibility, WakeLock, WakeLockManager};

/// Couples the session state machine with its side effects: the completion
/// signal and the wake lock.
pub struct Trainer {
    session: Session,
    wake_lock: WakeLockManager,
    signal: Box<dyn CompletionSignal>,
}

impl Trainer {
    pub fn new(session: Session, lock: Box<dyn WakeLock>, signal: Box<dyn CompletionSignal>) -> Self {
        Self {
            session,
            wake_lock: WakeLockManager::new(lock),
            signal,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> RoundStatus {
        self.session.status()
    }

    pub fn wake_lock_held(&self) -> bool {
        self.wake_lock.is_held()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn dispatch(&mut self, intent: Intent) -> bool {
        let applied = self.session.apply(intent);
        if applied {
            self.wake_lock.sync(self.session.status());
        }
        applied
    }

    pub fn on_tick(&mut self) -> TickOutcome {
        self.wake_lock.refresh();
        let outcome = self.session.on_tick();
        match outcome {
            TickOutcome::RoundComplete => {
                if let Err(e) = self.signal.notify_round_complete() {
                    warn!("completion signal failed: {}", e);
                }
                self.wake_lock.sync(self.session.status());
            }
            TickOutcome::ConfirmationLapsed => self.wake_lock.sync(self.session.status()),
            TickOutcome::Quiet | TickOutcome::RoundTick(_) | TickOutcome::ConfirmTick(_) => {}
        }
        outcome
    }

    pub fn on_visibility(&mut self, visibility: Visibility) {
        self.wake_lock.on_visibility(visibility, self.session.status());
    }

    pub fn teardown(&mut self) {
        self.wake_lock.teardown();
    }
}
