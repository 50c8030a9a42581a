//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use circlescope::provider::ProviderError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to create the HTTP client
    HttpClient(ProviderError),
    /// A service request failed
    Request(ProviderError),
    /// Invalid circle parameters
    Geometry(circlescope::geometry::GeometryError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Place search needs a Foursquare API key:");
                eprintln!("  pass --api-key or set FOURSQUARE_API_KEY");
            }
            CliError::Request(ProviderError::Status { status: 429, .. }) => {
                eprintln!();
                eprintln!("The service is rate limiting requests; retry in a minute.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Request(e) => write!(f, "Request failed: {}", e),
            CliError::Geometry(e) => write!(f, "Invalid circle: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::HttpClient(e) | CliError::Request(e) => Some(e),
            CliError::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Request(e)
    }
}

impl From<circlescope::geometry::GeometryError> for CliError {
    fn from(e: circlescope::geometry::GeometryError) -> Self {
        CliError::Geometry(e)
    }
}
