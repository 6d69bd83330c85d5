//! Print Lights - drives a WLED strip from PrusaLink printer telemetry.
//!
//! Five pollers, one per visual state, read the printer status, classify it
//! and keep exactly one of themselves running. The running poller renders its
//! state on the strip; the printing poller also speeds up or slows down with
//! the time remaining on the job.
//!
//! # Core Components
//!
//! * [`config`] - Configuration from environment variables and fixed policy constants
//! * [`printer`] - PrusaLink telemetry source and snapshot types
//! * [`wled`] - WLED light sink
//! * [`profiles`] - Render commands for each visual state
//! * [`classifier`] - Snapshot to visual state classification
//! * [`pollers`] - The poller set and its cadences
//! * [`tracker`] - Poller bodies and startup wiring
//! * [`error`] - Error types
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//! use print_lights::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let timeout = Duration::from_secs(config.http_timeout_seconds);
//! let printer = PrinterService::new(config.prusalink_url, config.prusalink_api_key, timeout)?;
//! let wled = WledService::new(config.wled_url, timeout)?;
//!
//! let tracker = Tracker::new(
//!     Arc::new(printer),
//!     Arc::new(wled),
//!     LedProfiles::new(config.led_count, config.led_rows),
//! );
//! let handle = tracker::start(Arc::new(tracker)).await?;
//! # handle.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod pollers;
pub mod printer;
pub mod profiles;
pub mod tracker;
pub mod wled;

// Re-export commonly used types for convenience
pub use classifier::{PollerDecision, VisualState, classify};
pub use config::Config;
pub use error::PrintLightsError;
pub use pollers::{Cadence, PollerSet};
pub use printer::{PrinterService, PrinterSnapshot, TelemetrySource};
pub use profiles::{LedProfiles, RenderCommand, RenderProfile};
pub use tracker::{FireOutcome, Tracker};
pub use wled::{LightSink, WledService};
