use crate::error::ConfigError;

/// Configuration for the Print Lights service loaded from environment variables.
///
/// Everything the service needs to reach the printer and the LED controller,
/// plus the physical layout of the strip. All values come from environment
/// variables to support containerized deployments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the WLED controller (e.g. "http://10.0.0.48").
    /// Environment variable: `WLED_URL`
    pub wled_url: String,

    /// Base URL of the PrusaLink printer (e.g. "http://10.0.0.44").
    ///
    /// The status path is appended by the telemetry client.
    /// Environment variable: `PRUSALINK_URL`
    pub prusalink_url: String,

    /// API key sent in the `X-Api-Key` header of every PrusaLink request.
    /// Environment variable: `PRUSALINK_API_KEY`
    pub prusalink_api_key: String,

    /// Total number of LEDs on the strip.
    /// Environment variable: `LED_COUNT`
    pub led_count: u32,

    /// Number of physical rows the strip is folded into.
    ///
    /// Must divide `led_count` evenly.
    /// Environment variable: `LED_ROWS`
    pub led_rows: u32,

    /// Per-request timeout for both HTTP clients, in seconds.
    /// Environment variable: `HTTP_TIMEOUT_SECONDS`
    pub http_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are not set or cannot be parsed:
    /// - `WLED_URL`: WLED controller URL (required)
    /// - `PRUSALINK_URL`: PrusaLink URL (required)
    /// - `PRUSALINK_API_KEY`: PrusaLink API key (required)
    /// - `LED_COUNT`: LEDs on the strip (default: "91")
    /// - `LED_ROWS`: Physical rows (default: "1")
    /// - `HTTP_TIMEOUT_SECONDS`: Request timeout (default: "5")
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value lookup.
    ///
    /// `load` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar {
                    var_name: key.to_string(),
                })
        };

        // Paths are appended with a leading slash.
        let wled_url = required("WLED_URL")?.trim_end_matches('/').to_string();
        let prusalink_url = required("PRUSALINK_URL")?
            .trim_end_matches('/')
            .to_string();
        let prusalink_api_key = required("PRUSALINK_API_KEY")?;

        let led_count = parse_or(&lookup, "LED_COUNT", defaults::LED_COUNT)?;
        let led_rows = parse_or(&lookup, "LED_ROWS", defaults::LED_ROWS)?;
        let http_timeout_seconds =
            parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", defaults::HTTP_TIMEOUT_SECONDS)?;

        if led_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "LED_COUNT".to_string(),
                value: led_count.to_string(),
                reason: "the strip needs at least one LED".to_string(),
            });
        }

        if led_rows == 0 || led_count % led_rows != 0 {
            return Err(ConfigError::InvalidValue {
                field: "LED_ROWS".to_string(),
                value: led_rows.to_string(),
                reason: format!("must be non-zero and divide LED_COUNT ({})", led_count),
            });
        }

        Ok(Config {
            wled_url,
            prusalink_url,
            prusalink_api_key,
            led_count,
            led_rows,
            http_timeout_seconds,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Defaults for the optional environment variables.
pub mod defaults {
    pub const LED_COUNT: u32 = 91;
    pub const LED_ROWS: u32 = 1;
    pub const HTTP_TIMEOUT_SECONDS: u64 = 5;
}

/// Application constants used throughout the system.
pub mod constants {
    /// Bed lagging its target by more than this (°C) counts as heating.
    pub const BED_HEATING_GAP: f64 = 4.0;

    /// Nozzle lagging its target by more than this (°C) counts as heating.
    pub const NOZZLE_HEATING_GAP: f64 = 6.0;

    /// Below this many seconds remaining the printing poller runs at the fast cadence.
    pub const NEAR_END_REMAINING_SECONDS: f64 = 600.0;

    /// PrusaLink status endpoint, relative to the printer base URL.
    pub const PRUSALINK_STATUS_PATH: &str = "/api/v1/status";

    /// WLED liveness endpoint.
    pub const WLED_INFO_PATH: &str = "/json/info";

    /// WLED state endpoint accepting render commands.
    pub const WLED_STATE_PATH: &str = "/json";

    /// Empty segments appended to full-strip animations to clear leftovers.
    pub const EMPTY_TRAILING_SEGMENTS: usize = 10;
}
