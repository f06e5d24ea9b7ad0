//! CLI command handlers.

use std::path::PathBuf;

use copilot_config::ConfigResolver;

pub mod ask;
pub mod config;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Where the settings store search starts; current directory when unset.
    pub start_dir: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Snapshot the process environment into a resolver.
    pub fn resolver(&self) -> ConfigResolver {
        match &self.start_dir {
            Some(dir) => ConfigResolver::new(std::env::vars(), dir.clone()),
            None => ConfigResolver::from_process(),
        }
    }
}
