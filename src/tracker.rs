//! Poller bodies and startup wiring.
//!
//! Every fire of every poller reads a fresh snapshot, re-classifies it and
//! applies the decision to the poller set. Only the poller whose own state
//! matches the classification renders; any other fire is stale and is
//! dropped without touching the strip.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::classifier::{PollerDecision, VisualState, classify};
use crate::config::constants;
use crate::pollers::{Cadence, PollerSet, Schedule};
use crate::printer::{JobStatus, PrinterSnapshot, PrinterStatus, TelemetrySource};
use crate::profiles::{LedProfiles, RenderProfile};
use crate::wled::LightSink;

/// Result of one poller fire that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// A command was built and sent to the light sink.
    Rendered(RenderProfile),
    /// The snapshot classified as another state; nothing was sent.
    Stale { classified: VisualState },
    /// Heating with no nozzle target, so there is no percentage to show.
    NoRenderablePercentage,
}

/// Heat-up progress of the nozzle in percent, rounded and clamped to 0-100.
///
/// `None` when the nozzle has no target.
pub fn heating_percentage(printer: &PrinterStatus) -> Option<f64> {
    if printer.target_nozzle == 0.0 {
        return None;
    }
    let percentage = (printer.temp_nozzle * 100.0 / printer.target_nozzle).round();
    Some(percentage.clamp(0.0, 100.0))
}

/// Seconds of job time one LED stands for over a 100 minute job.
pub fn total_job_duration_threshold(leds: u32) -> f64 {
    100.0 / leds.max(1) as f64 * 60.0
}

/// Cadence of the printing poller for the given job progress.
///
/// Fast near the end of a job, medium for jobs shorter than
/// [`total_job_duration_threshold`], fast otherwise.
pub fn printing_cadence(job: &JobStatus, leds: u32) -> Cadence {
    if job.time_remaining < constants::NEAR_END_REMAINING_SECONDS {
        Cadence::FAST
    } else if job.time_remaining + job.time_printing < total_job_duration_threshold(leds) {
        Cadence::MEDIUM
    } else {
        Cadence::FAST
    }
}

/// Drives the light sink from printer telemetry through five pollers.
pub struct Tracker {
    telemetry: Arc<dyn TelemetrySource>,
    light: Arc<dyn LightSink>,
    profiles: LedProfiles,
    pollers: PollerSet,
    print_started: Mutex<Option<DateTime<Local>>>,
}

impl Tracker {
    /// Create a tracker with all five pollers stopped.
    pub fn new(
        telemetry: Arc<dyn TelemetrySource>,
        light: Arc<dyn LightSink>,
        profiles: LedProfiles,
    ) -> Self {
        Self {
            telemetry,
            light,
            profiles,
            pollers: PollerSet::new(),
            print_started: Mutex::new(None),
        }
    }

    pub fn pollers(&self) -> &PollerSet {
        &self.pollers
    }

    /// When the printing poller first rendered the current job.
    pub fn print_started(&self) -> Option<DateTime<Local>> {
        *self
            .print_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the body of poller `own` once.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be fetched or the command
    /// cannot be delivered. Neither is retried; the next fire tries again.
    pub async fn fire(&self, own: VisualState) -> Result<FireOutcome> {
        debug!("Poller fired: {}", own);
        let snapshot = self
            .telemetry
            .fetch_snapshot()
            .await
            .context("Failed to get printer state")?;
        self.handle_snapshot(own, &snapshot).await
    }

    /// Classify `snapshot`, update the poller set and render if `own` still matches.
    pub async fn handle_snapshot(
        &self,
        own: VisualState,
        snapshot: &PrinterSnapshot,
    ) -> Result<FireOutcome> {
        let (classified, decision) = classify(snapshot);
        self.pollers.apply_decision(&decision);

        // Back to idle means the job ended without finishing.
        if classified == VisualState::Idle {
            self.forget_print_started();
        }

        if classified != own {
            debug!("Dropping stale {} fire, printer is {}", own, classified);
            return Ok(FireOutcome::Stale { classified });
        }

        let (profile, percentage) = match own {
            VisualState::PrintingHeating => match heating_percentage(&snapshot.printer) {
                Some(percentage) => (RenderProfile::Heating, percentage),
                None => return Ok(FireOutcome::NoRenderablePercentage),
            },
            VisualState::PrintingPercentage => {
                let progress = snapshot.job_or_default().progress;
                debug!("Printing progress: {}%", progress);
                self.mark_print_started();
                (RenderProfile::Printing, progress)
            }
            VisualState::Idle => (RenderProfile::Idle, 100.0),
            VisualState::SwitchingFilament => (RenderProfile::SwitchingFilament, 0.0),
            VisualState::PrintingFinished => {
                self.clear_print_started();
                (RenderProfile::Finished, 0.0)
            }
        };

        let command = self.profiles.render(profile, percentage);
        self.light
            .apply(&command)
            .await
            .context("Failed to update WLED")?;

        // Only retuned after a delivered render.
        if own == VisualState::PrintingPercentage {
            let cadence = printing_cadence(&snapshot.job_or_default(), self.profiles.leds());
            self.pollers.retune(VisualState::PrintingPercentage, cadence);
        }

        Ok(FireOutcome::Rendered(profile))
    }

    fn mark_print_started(&self) {
        let mut started = self
            .print_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if started.is_none() {
            *started = Some(Local::now());
        }
    }

    fn forget_print_started(&self) {
        let started = self
            .print_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if started.is_some() {
            debug!("Job left without finishing, print start cleared");
        }
    }

    fn clear_print_started(&self) {
        let started = self
            .print_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(started) = started {
            let elapsed = Local::now().signed_duration_since(started);
            info!(
                "Print finished after {}h {}m {}s",
                elapsed.num_hours(),
                elapsed.num_minutes() % 60,
                elapsed.num_seconds() % 60
            );
        }
    }

    /// Check that both the LED controller and the printer answer.
    pub async fn life_check(&self) -> Result<()> {
        self.light
            .life_check()
            .await
            .context("WLED is not available")?;
        self.telemetry
            .life_check()
            .await
            .context("Prusa is not available")?;
        Ok(())
    }

    /// Classify the first snapshot so the right poller runs before any timer fires.
    ///
    /// Also renders that state once.
    pub async fn initiate_tracking(&self) -> Result<VisualState> {
        let snapshot = self
            .telemetry
            .fetch_snapshot()
            .await
            .context("Failed to read initial printer state")?;
        let (state, _) = classify(&snapshot);
        if let Err(e) = self.handle_snapshot(state, &snapshot).await {
            warn!("Initial render failed: {:#}", e);
        }
        Ok(state)
    }

    /// Spawn one timer task per poller. Tasks park until their poller starts.
    pub fn spawn_pollers(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        VisualState::ALL
            .into_iter()
            .map(|name| {
                let schedule = self.pollers.subscribe(name);
                tokio::spawn(run_poller(Arc::clone(self), name, schedule))
            })
            .collect()
    }
}

async fn run_poller(
    tracker: Arc<Tracker>,
    name: VisualState,
    mut schedule: watch::Receiver<Schedule>,
) {
    loop {
        let current = *schedule.borrow_and_update();
        if !current.running {
            if schedule.changed().await.is_err() {
                break;
            }
            continue;
        }

        tokio::select! {
            changed = schedule.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep(current.cadence.period()) => {
                match tracker.fire(name).await {
                    Ok(FireOutcome::NoRenderablePercentage) => {
                        debug!("{} poller: nozzle has no target, nothing to render", name);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("{} poller: {:#}", name, e),
                }
            }
        }
    }
}

/// Running timer tasks of a started tracker.
pub struct TrackingHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl TrackingHandle {
    /// Abort every timer task.
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Start tracking: liveness check, timer tasks, then the initial classification.
///
/// # Errors
///
/// Returns an error if either collaborator fails its liveness check; no
/// poller is created in that case.
pub async fn start(tracker: Arc<Tracker>) -> Result<TrackingHandle> {
    tracker.life_check().await?;

    let tasks = tracker.spawn_pollers();
    info!("Created {} pollers", tasks.len());

    match tracker.initiate_tracking().await {
        Ok(state) => info!("Initial printer state: {}", state),
        Err(e) => {
            warn!("{:#}. Falling back to the idle poller", e);
            tracker
                .pollers()
                .apply_decision(&PollerDecision::only(VisualState::Idle));
        }
    }

    Ok(TrackingHandle { tasks })
}
