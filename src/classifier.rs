//! Classification of printer snapshots into the state shown on the strip.
//!
//! `classify` is pure: it names which poller should run and which should
//! stop, and leaves the timers themselves to [`crate::pollers::PollerSet`].

use std::fmt;

use crate::config::constants;
use crate::printer::{PrinterSnapshot, PrinterState, PrinterStatus};

/// The mutually exclusive states the strip can show.
///
/// Each state is also the identity of the poller that renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualState {
    PrintingHeating,
    PrintingPercentage,
    Idle,
    SwitchingFilament,
    PrintingFinished,
}

impl VisualState {
    pub const ALL: [VisualState; 5] = [
        VisualState::PrintingHeating,
        VisualState::PrintingPercentage,
        VisualState::Idle,
        VisualState::SwitchingFilament,
        VisualState::PrintingFinished,
    ];

    /// Position in [`VisualState::ALL`].
    pub fn index(self) -> usize {
        match self {
            VisualState::PrintingHeating => 0,
            VisualState::PrintingPercentage => 1,
            VisualState::Idle => 2,
            VisualState::SwitchingFilament => 3,
            VisualState::PrintingFinished => 4,
        }
    }
}

impl fmt::Display for VisualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VisualState::PrintingHeating => "Printing Heating",
            VisualState::PrintingPercentage => "Printing Percentage",
            VisualState::Idle => "Idle",
            VisualState::SwitchingFilament => "Switching Filament",
            VisualState::PrintingFinished => "Printing Finished",
        };
        f.write_str(name)
    }
}

/// Which poller to start and which to stop, decided as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerDecision {
    pub start: VisualState,
    pub stop: Vec<VisualState>,
}

impl PollerDecision {
    /// Start `start`, stop every other poller.
    pub fn only(start: VisualState) -> Self {
        Self {
            start,
            stop: VisualState::ALL
                .into_iter()
                .filter(|state| *state != start)
                .collect(),
        }
    }
}

/// True while the bed or nozzle is still well below a non-zero target.
pub fn is_heating(printer: &PrinterStatus) -> bool {
    let bed_lagging = printer.target_bed != 0.0
        && printer.target_bed - printer.temp_bed > constants::BED_HEATING_GAP;
    let nozzle_lagging = printer.target_nozzle != 0.0
        && printer.target_nozzle - printer.temp_nozzle > constants::NOZZLE_HEATING_GAP;
    bed_lagging || nozzle_lagging
}

/// Derive the visual state of a snapshot and the matching poller decision.
///
/// The heat-up check only applies while the printer reports `PRINTING` or
/// `BUSY`; unrecognised states fall back to idle.
pub fn classify(snapshot: &PrinterSnapshot) -> (VisualState, PollerDecision) {
    let printer = &snapshot.printer;
    let heating_applies = matches!(printer.state, PrinterState::Printing | PrinterState::Busy);

    let state = if heating_applies && is_heating(printer) {
        VisualState::PrintingHeating
    } else {
        match printer.state {
            PrinterState::Printing => VisualState::PrintingPercentage,
            PrinterState::Idle => VisualState::Idle,
            PrinterState::Busy => VisualState::SwitchingFilament,
            PrinterState::Finished => VisualState::PrintingFinished,
            PrinterState::Attention => VisualState::SwitchingFilament,
            PrinterState::Unknown => VisualState::Idle,
        }
    };

    (state, PollerDecision::only(state))
}
