use std::fmt;

/// Custom error types for the Print Lights service.
///
/// The HTTP clients and the configuration loader raise these typed errors;
/// the tracker and `main` carry them inside `anyhow::Error` so the cause
/// message survives into the log line.

/// Main error type for Print Lights operations.
#[derive(Debug)]
pub enum PrintLightsError {
    /// Errors raised while talking to the PrusaLink printer.
    PrinterError(PrinterError),

    /// Errors raised while talking to the WLED controller.
    LightError(LightError),

    /// Configuration and setup errors.
    ConfigError(ConfigError),
}

/// Errors specific to the printer telemetry endpoint.
#[derive(Debug)]
pub enum PrinterError {
    /// Printer API returned an error response.
    ApiError {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The API key was rejected.
    AuthenticationFailed { api_url: String },
}

/// Errors specific to the LED controller.
#[derive(Debug)]
pub enum LightError {
    /// Controller returned an error response.
    ApiError { endpoint: String, status: u16 },
}

/// Errors related to configuration and application setup.
#[derive(Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    MissingEnvVar { var_name: String },

    /// Invalid configuration values provided.
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl fmt::Display for PrintLightsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintLightsError::PrinterError(e) => write!(f, "Printer error: {}", e),
            PrintLightsError::LightError(e) => write!(f, "Light error: {}", e),
            PrintLightsError::ConfigError(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for PrinterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterError::ApiError {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "Printer API error at '{}' (HTTP {}): {}",
                    endpoint, status, message
                )
            }
            PrinterError::AuthenticationFailed { api_url } => {
                write!(f, "Authentication failed for printer API at '{}'", api_url)
            }
        }
    }
}

impl fmt::Display for LightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightError::ApiError { endpoint, status } => {
                write!(f, "WLED error at '{}' (HTTP {})", endpoint, status)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingEnvVar { var_name } => {
                write!(f, "Required environment variable '{}' is not set", var_name)
            }
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, reason
                )
            }
        }
    }
}

impl std::error::Error for PrintLightsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrintLightsError::PrinterError(e) => Some(e),
            PrintLightsError::LightError(e) => Some(e),
            PrintLightsError::ConfigError(e) => Some(e),
        }
    }
}

impl std::error::Error for PrinterError {}
impl std::error::Error for LightError {}
impl std::error::Error for ConfigError {}

impl From<PrinterError> for PrintLightsError {
    fn from(err: PrinterError) -> Self {
        PrintLightsError::PrinterError(err)
    }
}

impl From<LightError> for PrintLightsError {
    fn from(err: LightError) -> Self {
        PrintLightsError::LightError(err)
    }
}

impl From<ConfigError> for PrintLightsError {
    fn from(err: ConfigError) -> Self {
        PrintLightsError::ConfigError(err)
    }
}
