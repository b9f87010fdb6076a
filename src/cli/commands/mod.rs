//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`].

pub mod dispatcher;
pub mod list;
pub mod run;
pub mod validate;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, EXIT_FAILURE, EXIT_PARSE_ERROR};
pub use list::ListCommand;
pub use run::RunCommand;
pub use validate::ValidateCommand;
