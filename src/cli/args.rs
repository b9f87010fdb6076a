//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::backend::DEFAULT_AGENT_COMMAND;
use crate::ui::OutputMode;

/// recipe-runner - Execute declarative YAML recipes of shell and agent steps.
#[derive(Debug, Parser)]
#[command(name = "recipe-runner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show step output as it completes
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Output mode implied by the global flags and the subcommand.
    pub fn output_mode(&self) -> OutputMode {
        match &self.command {
            Commands::Run(args) if args.json => OutputMode::Silent,
            _ => OutputMode::from_flags(self.verbose, self.quiet),
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute a recipe
    Run(RunArgs),

    /// Parse a recipe and report warnings
    Validate(ValidateArgs),

    /// List the steps of a recipe
    List(ListArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Recipe file
    pub file: PathBuf,

    /// Set a context variable (value parsed as YAML, repeatable)
    #[arg(short, long = "context", value_name = "KEY=VALUE", value_parser = parse_context_pair)]
    pub context: Vec<(String, Value)>,

    /// Walk the recipe without dispatching any step
    #[arg(long)]
    pub dry_run: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory containing agent definitions (repeatable)
    #[arg(long = "agents-dir", value_name = "DIR", env = "RECIPE_AGENTS_DIR")]
    pub agents_dirs: Vec<PathBuf>,

    /// Base directory for steps
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Agent CLI binary
    #[arg(long, value_name = "BIN", env = "RECIPE_AGENT_COMMAND", default_value = DEFAULT_AGENT_COMMAND)]
    pub agent_command: String,
}

impl RunArgs {
    /// Args for running `file` with everything else defaulted.
    pub fn for_file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            context: Vec::new(),
            dry_run: false,
            json: false,
            agents_dirs: Vec::new(),
            working_dir: None,
            agent_command: DEFAULT_AGENT_COMMAND.to_string(),
        }
    }
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    /// Recipe file
    pub file: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ListArgs {
    /// Recipe file
    pub file: PathBuf,
}

/// Parse `KEY=VALUE`, reading the value as YAML.
///
/// `count=3` yields a number, `flags=[a, b]` a list, and anything that is
/// not valid YAML (or is empty) stays a plain string.
pub fn parse_context_pair(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }

    let parsed = match serde_yaml::from_str::<Value>(value) {
        Ok(Value::Null) | Err(_) => Value::String(value.to_string()),
        Ok(v) => v,
    };

    Ok((key.to_string(), parsed))
}
