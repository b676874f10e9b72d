use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::catalog::{Catalog, ComboSelector, Combination, FreshSelector, RandomSelector};
use crate::countdown::{Countdown, CountdownEvent};
use crate::util::format_clock;

pub const ROUND_SECS: u32 = 180;
pub const CONFIRM_SECS: u32 = 5;
pub const MAX_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RoundStatus {
    #[strum(serialize = "ready")]
    Idle,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "round over")]
    RoundOver,
    #[strum(serialize = "confirm next round")]
    ConfirmPending,
}

/// User requests forwarded from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    BeginRound,
    RequestNextRound,
    ConfirmNextRound,
    CancelNextRound,
    RestartSession,
}

/// What a one-second tick did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was counting down
    Quiet,
    RoundTick(u32),
    /// Round timer hit zero; the session is now in `RoundOver`
    RoundComplete,
    ConfirmTick(u32),
    /// Confirmation window ran out; the session is back in `RoundOver`
    ConfirmationLapsed,
}

/// Read-only view of a session for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: RoundStatus,
    pub combos: Vec<Combination>,
    pub round_secs_left: u32,
    pub confirm_secs_left: Option<u32>,
    pub can_advance: bool,
    pub rounds_completed: usize,
    pub started_at: DateTime<Local>,
}

impl SessionSnapshot {
    pub fn time_left(&self) -> String {
        format_clock(self.round_secs_left)
    }
}

/// The round/session state machine.
///
/// Transition methods return `true` when the transition was taken. Requests
/// that make no sense in the current state are ignored and return `false`.
#[derive(Debug)]
pub struct Session {
    status: RoundStatus,
    catalog: Catalog,
    combos: Vec<Combination>,
    round_timer: Countdown,
    confirm_timer: Option<Countdown>,
    rounds_completed: usize,
    started_at: DateTime<Local>,
    rng: StdRng,
}

impl Session {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::default(), StdRng::from_entropy())
    }

    /// Deterministic draws, for tests and `--seed`
    pub fn seeded(seed: u64) -> Self {
        Self::with_catalog(Catalog::default(), StdRng::seed_from_u64(seed))
    }

    pub fn with_catalog(catalog: Catalog, mut rng: StdRng) -> Self {
        let first = RandomSelector.select(&catalog, &[], &mut rng);
        Self {
            status: RoundStatus::Idle,
            catalog,
            combos: vec![first],
            round_timer: Countdown::stopped(ROUND_SECS),
            confirm_timer: None,
            rounds_completed: 0,
            started_at: Local::now(),
            rng,
        }
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn combos(&self) -> &[Combination] {
        &self.combos
    }

    /// The combination for the round in progress (top of the stack)
    pub fn current_combo(&self) -> &Combination {
        // the stack is never empty
        &self.combos[self.combos.len() - 1]
    }

    pub fn round_secs_left(&self) -> u32 {
        self.round_timer.remaining()
    }

    pub fn confirm_secs_left(&self) -> Option<u32> {
        self.confirm_timer.as_ref().map(Countdown::remaining)
    }

    pub fn can_advance(&self) -> bool {
        self.combos.len() < MAX_ROUNDS
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    pub fn apply(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::BeginRound => self.begin_round(),
            Intent::RequestNextRound => self.request_next_round(),
            Intent::ConfirmNextRound => self.confirm_next_round(),
            Intent::CancelNextRound => self.cancel_next_round(),
            Intent::RestartSession => {
                self.restart();
                true
            }
        }
    }

    pub fn begin_round(&mut self) -> bool {
        if self.status != RoundStatus::Idle {
            debug!(status = %self.status, "ignoring begin round");
            return false;
        }

        self.round_timer = Countdown::start(ROUND_SECS);
        self.status = RoundStatus::Running;
        info!(round = self.combos.len(), combo = %self.current_combo(), "round started");
        true
    }

    pub fn request_next_round(&mut self) -> bool {
        if self.status != RoundStatus::RoundOver || !self.can_advance() {
            debug!(status = %self.status, rounds = self.combos.len(), "ignoring next round request");
            return false;
        }

        self.round_timer.cancel();
        self.confirm_timer = Some(Countdown::start(CONFIRM_SECS));
        self.status = RoundStatus::ConfirmPending;
        true
    }

    pub fn confirm_next_round(&mut self) -> bool {
        if self.status != RoundStatus::ConfirmPending || !self.can_advance() {
            debug!(status = %self.status, "ignoring next round confirmation");
            return false;
        }

        self.confirm_timer = None;
        let next = FreshSelector.select(&self.catalog, &self.combos, &mut self.rng);
        self.combos.push(next);
        self.round_timer = Countdown::start(ROUND_SECS);
        self.status = RoundStatus::Running;
        info!(round = self.combos.len(), combo = %self.current_combo(), "round started");
        true
    }

    pub fn cancel_next_round(&mut self) -> bool {
        if self.status != RoundStatus::ConfirmPending {
            debug!(status = %self.status, "ignoring next round cancel");
            return false;
        }

        self.confirm_timer = None;
        self.status = RoundStatus::RoundOver;
        true
    }

    /// Always available: a fresh single-combo stack, back to `Idle`
    pub fn restart(&mut self) {
        self.confirm_timer = None;
        self.combos = vec![RandomSelector.select(&self.catalog, &[], &mut self.rng)];
        self.round_timer = Countdown::stopped(ROUND_SECS);
        self.rounds_completed = 0;
        self.started_at = Local::now();
        self.status = RoundStatus::Idle;
        info!(combo = %self.current_combo(), "session restarted");
    }

    pub fn on_tick(&mut self) -> TickOutcome {
        match self.status {
            RoundStatus::Running => match self.round_timer.on_tick() {
                Some(CountdownEvent::Tick(left)) => TickOutcome::RoundTick(left),
                Some(CountdownEvent::Expired) => {
                    self.status = RoundStatus::RoundOver;
                    self.rounds_completed += 1;
                    info!(round = self.combos.len(), "round complete");
                    TickOutcome::RoundComplete
                }
                None => TickOutcome::Quiet,
            },
            RoundStatus::ConfirmPending => {
                let event = self.confirm_timer.as_mut().and_then(Countdown::on_tick);
                match event {
                    Some(CountdownEvent::Tick(left)) => TickOutcome::ConfirmTick(left),
                    Some(CountdownEvent::Expired) => {
                        self.confirm_timer = None;
                        self.status = RoundStatus::RoundOver;
                        debug!("confirmation window lapsed");
                        TickOutcome::ConfirmationLapsed
                    }
                    None => TickOutcome::Quiet,
                }
            }
            RoundStatus::Idle | RoundStatus::RoundOver => TickOutcome::Quiet,
        }
    }

    /// Number of timers counting down right now (never more than one)
    pub fn ticking_timers(&self) -> usize {
        let round = usize::from(self.round_timer.is_running());
        let confirm = usize::from(self.confirm_timer.as_ref().is_some_and(Countdown::is_running));
        round + confirm
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            combos: self.combos.clone(),
            round_secs_left: self.round_secs_left(),
            confirm_secs_left: self.confirm_secs_left(),
            can_advance: self.can_advance(),
            rounds_completed: self.rounds_completed,
            started_at: self.started_at,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
