use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::{error, info};

use print_lights::{
    Config, LedProfiles, PrintLightsError, PrinterService, Tracker, WledService, tracker,
};

/// Print Lights - mirrors the state of a Prusa printer on a WLED strip.
///
/// Shows a heat-up bar while the bed or nozzle warms, a progress bar while
/// printing, an orange idle glow, a chase while filament is being switched
/// and fireworks when the job is done.
///
/// # Environment Variables
///
/// Required:
/// * `WLED_URL` - Base URL of the WLED controller
/// * `PRUSALINK_URL` - Base URL of the printer running PrusaLink
/// * `PRUSALINK_API_KEY` - PrusaLink API key
///
/// Optional (with defaults):
/// * `LED_COUNT` - LEDs on the strip (default: "91")
/// * `LED_ROWS` - Physical rows of the strip (default: "1")
/// * `HTTP_TIMEOUT_SECONDS` - Request timeout (default: "5")
///
/// # Usage
///
/// ```bash
/// export WLED_URL="http://wled.local"
/// export PRUSALINK_URL="http://printer.local"
/// export PRUSALINK_API_KEY="..."
/// ./print-lights
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logger to output to stdout, using RUST_LOG env var or info level by default
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stdout)
        .filter_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|level| level.parse().ok())
                .unwrap_or(log::LevelFilter::Info),
        )
        .init();

    let config = Config::load().map_err(PrintLightsError::from)?;

    info!("Print Lights starting...");
    info!("Using PrusaLink at: {}", config.prusalink_url);
    info!(
        "Using WLED at: {} ({} LEDs in {} row(s))",
        config.wled_url, config.led_count, config.led_rows
    );

    let timeout = Duration::from_secs(config.http_timeout_seconds);
    let printer_service = PrinterService::new(
        config.prusalink_url.clone(),
        config.prusalink_api_key.clone(),
        timeout,
    )?;
    let wled_service = WledService::new(config.wled_url.clone(), timeout)?;
    info!(
        "Services initialized for printer {} and WLED {}",
        printer_service.api_url,
        wled_service.base_url()
    );

    let tracker = Arc::new(Tracker::new(
        Arc::new(printer_service),
        Arc::new(wled_service),
        LedProfiles::new(config.led_count, config.led_rows),
    ));

    // Without both collaborators the process stays up but does nothing.
    let handle = match tracker::start(tracker).await {
        Ok(handle) => {
            info!("Print Lights tracking started");
            Some(handle)
        }
        Err(e) => {
            error!("Prusa or WLED is not ALIVE: {:#}", e);
            None
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    if let Some(handle) = handle {
        handle.shutdown();
    }

    Ok(())
}
