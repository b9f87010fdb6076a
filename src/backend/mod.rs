//! Execution backends.
//!
//! The runner never spawns processes itself. It hands fully rendered step
//! bodies to an [`ExecutionBackend`], which owns how commands and agent
//! invocations actually happen.

mod cli;

pub use cli::{CliBackend, DEFAULT_AGENT_COMMAND};

use crate::error::BackendError;
use std::path::Path;
use std::time::Duration;

/// Executes rendered step bodies on behalf of the runner.
pub trait ExecutionBackend {
    /// Run a shell command and return its standard output.
    ///
    /// The command has already been rendered with shell escaping.
    fn execute_bash_step(
        &self,
        command: &str,
        working_dir: Option<&Path>,
        timeout: Duration,
    ) -> Result<String, BackendError>;

    /// Run an agent with a rendered prompt and return its final output.
    fn execute_agent_step(
        &self,
        prompt: &str,
        agent_name: Option<&str>,
        agent_system_prompt: Option<&str>,
        mode: Option<&str>,
        working_dir: Option<&Path>,
    ) -> Result<String, BackendError>;
}
