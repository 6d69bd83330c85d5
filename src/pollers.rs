//! The set of five named pollers and the only code path that mutates them.
//!
//! Each poller's schedule lives in a `watch` channel. The timer task of a
//! poller holds the receiving end: it parks while the poller is stopped and
//! sleeps for the current cadence while it is running.

use std::fmt;
use std::time::Duration;

use log::info;
use tokio::sync::watch;

use crate::classifier::{PollerDecision, VisualState};

/// How often a running poller fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    EverySecond,
    Every5Seconds,
    Every10Seconds,
}

impl Cadence {
    /// Used by the printing poller near the end of a job.
    pub const FAST: Cadence = Cadence::Every5Seconds;
    /// Used by the printing poller for short jobs.
    pub const MEDIUM: Cadence = Cadence::Every10Seconds;

    pub fn period(self) -> Duration {
        match self {
            Cadence::EverySecond => Duration::from_secs(1),
            Cadence::Every5Seconds => Duration::from_secs(5),
            Cadence::Every10Seconds => Duration::from_secs(10),
        }
    }

    /// Cadence a poller is created with.
    pub fn initial(state: VisualState) -> Cadence {
        match state {
            VisualState::PrintingHeating => Cadence::EverySecond,
            VisualState::PrintingPercentage => Cadence::Every10Seconds,
            VisualState::Idle => Cadence::Every5Seconds,
            VisualState::SwitchingFilament => Cadence::EverySecond,
            VisualState::PrintingFinished => Cadence::EverySecond,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {}s", self.period().as_secs())
    }
}

/// Snapshot of one poller's timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub running: bool,
    pub cadence: Cadence,
}

struct Poller {
    name: VisualState,
    schedule: watch::Sender<Schedule>,
}

/// What `apply_decision` actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub stopped: Vec<VisualState>,
    pub started: Option<VisualState>,
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.stopped.is_empty() && self.started.is_none()
    }
}

/// Owns the five pollers. All pollers are created stopped.
pub struct PollerSet {
    pollers: [Poller; 5],
}

impl Default for PollerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PollerSet {
    pub fn new() -> Self {
        let pollers = VisualState::ALL.map(|name| {
            let (schedule, _) = watch::channel(Schedule {
                running: false,
                cadence: Cadence::initial(name),
            });
            Poller { name, schedule }
        });
        Self { pollers }
    }

    fn poller(&self, name: VisualState) -> &Poller {
        &self.pollers[name.index()]
    }

    /// Receiver the timer task of `name` waits on.
    pub fn subscribe(&self, name: VisualState) -> watch::Receiver<Schedule> {
        self.poller(name).schedule.subscribe()
    }

    pub fn schedule(&self, name: VisualState) -> Schedule {
        *self.poller(name).schedule.borrow()
    }

    pub fn is_running(&self, name: VisualState) -> bool {
        self.schedule(name).running
    }

    pub fn cadence(&self, name: VisualState) -> Cadence {
        self.schedule(name).cadence
    }

    /// Names of the pollers currently running.
    pub fn running(&self) -> Vec<VisualState> {
        self.pollers
            .iter()
            .filter(|poller| poller.schedule.borrow().running)
            .map(|poller| poller.name)
            .collect()
    }

    /// Stop every poller in `decision.stop`, then start `decision.start`.
    ///
    /// Stops come first so two pollers never render in the same instant.
    /// Pollers already in the requested state are left untouched.
    pub fn apply_decision(&self, decision: &PollerDecision) -> Transition {
        let mut transition = Transition::default();

        for &name in &decision.stop {
            if name == decision.start {
                continue;
            }
            let stopped = self.poller(name).schedule.send_if_modified(|schedule| {
                let was_running = schedule.running;
                schedule.running = false;
                was_running
            });
            if stopped {
                info!("Stopped poller: {}", name);
                transition.stopped.push(name);
            }
        }

        let started = self
            .poller(decision.start)
            .schedule
            .send_if_modified(|schedule| {
                let was_stopped = !schedule.running;
                schedule.running = true;
                was_stopped
            });
        if started {
            info!("Started poller: {}", decision.start);
            transition.started = Some(decision.start);
        }

        transition
    }

    /// Replace the cadence of `name` if it differs.
    ///
    /// The running timer picks the new cadence up for its next fire.
    /// Returns whether anything changed.
    pub fn retune(&self, name: VisualState, cadence: Cadence) -> bool {
        let mut previous = cadence;
        let changed = self.poller(name).schedule.send_if_modified(|schedule| {
            previous = schedule.cadence;
            schedule.cadence = cadence;
            previous != cadence
        });
        if changed {
            info!(
                "Cadence for {} updated from {} to {}",
                name, previous, cadence
            );
        }
        changed
    }
}
