//! Shell and process execution.
//!
//! - [`execute`] runs a command line through `sh -c` with an optional timeout
//! - [`execute_program`] runs a binary with arguments and no shell
//! - [`quote`] turns any value into a single literal shell word
//! - [`SessionEnv`] is an explicit environment handed to child processes

mod command;
mod quote;
mod session;

pub use command::{
    execute, execute_program, CommandOptions, CommandResult, OutputLine, OutputObserver,
};
pub use quote::{join, quote};
pub use session::{SessionEnv, SESSION_MARKER};
