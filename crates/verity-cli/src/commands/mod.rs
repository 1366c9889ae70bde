//! CLI command implementations
//!
//! Each command returns `Ok(true)` on a positive answer and `Ok(false)`
//! when the directory said no; `main` turns the latter into a failing
//! exit code.

pub mod authenticate;
pub mod fetch_user;
pub mod probe;
pub mod show_config;

use crate::OutputFormat;
use verity_core::VerityConfig;

/// Context passed to all commands
pub struct CommandContext {
    pub config: VerityConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }
}
