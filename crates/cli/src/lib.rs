//! Omnilytics CLI Library
//!
//! Command-line interface components for sending usage analytics events and
//! trying out omnibox query suggestions from a terminal.

use omnilytics_core::{OmnilyticsError, Result};

pub mod commands;
pub mod config;
pub mod output;

pub use commands::*;
pub use config::*;
pub use output::*;

/// CLI version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the CLI environment
pub fn init() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("Omnilytics CLI encountered an error: {}", info);
    }));

    Ok(())
}

/// Get the appropriate exit code for an error
pub fn exit_code_for_error(error: &OmnilyticsError) -> i32 {
    match error {
        OmnilyticsError::Validation { .. }
        | OmnilyticsError::Config(_)
        | OmnilyticsError::Yaml(_)
        | OmnilyticsError::Url(_) => 2,
        OmnilyticsError::NotFound { .. } => 3,
        OmnilyticsError::Network { .. }
        | OmnilyticsError::Http(_)
        | OmnilyticsError::Endpoint(_) => 5,
        OmnilyticsError::Timeout { .. } => 6,
        _ => 1,
    }
}
