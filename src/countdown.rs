/// Observation emitted by a running countdown on each one-second tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// One second elapsed; the payload is the number of seconds left
    Tick(u32),
    /// Reached zero. Emitted exactly once, after which the countdown stops
    Expired,
}

/// One-tick-per-second countdown.
///
/// A countdown never restarts itself. Callers create a fresh one with
/// [`Countdown::start`] whenever a new timed phase begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn start(secs: u32) -> Self {
        Self {
            remaining: secs,
            running: true,
        }
    }

    /// A countdown that only holds a value for display and never ticks
    pub fn stopped(secs: u32) -> Self {
        Self {
            remaining: secs,
            running: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop ticking. Safe to call on a countdown that is not running.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn on_tick(&mut self) -> Option<CountdownEvent> {
        if !self.running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Some(CountdownEvent::Expired)
        } else {
            Some(CountdownEvent::Tick(self.remaining))
        }
    }
}
