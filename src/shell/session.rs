//! Explicit child-process environments.
//!
//! Agent CLIs refuse to start when they detect that they are already running
//! inside a session of themselves. Rather than mutating the parent's process
//! environment, the backend builds a [`SessionEnv`] value, removes the
//! marker from it, and hands the whole environment to the child.

use std::collections::BTreeMap;
use std::process::Command;

/// Variable set by the host agent CLI inside its own sessions.
pub const SESSION_MARKER: &str = "CLAUDECODE";

/// A complete environment for a child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnv {
    vars: BTreeMap<String, String>,
}

impl SessionEnv {
    /// Snapshot the current process environment.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Whether this environment belongs to a running agent session.
    pub fn is_nested(&self) -> bool {
        self.vars.contains_key(SESSION_MARKER)
    }

    /// Copy with the session marker removed.
    pub fn without_session_marker(&self) -> Self {
        let mut env = self.clone();
        env.remove(SESSION_MARKER);
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Replace the command's environment with exactly these variables.
    pub fn apply(&self, cmd: &mut Command) {
        cmd.env_clear();
        cmd.envs(&self.vars);
    }
}
