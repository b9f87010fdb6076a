//! Command-line interface.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{parse_context_pair, Cli, Commands, ListArgs, RunArgs, ValidateArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
