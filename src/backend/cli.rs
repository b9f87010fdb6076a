//! Backend that runs bash steps through the system shell and agent steps
//! through a host agent CLI.

use super::ExecutionBackend;
use crate::error::BackendError;
use crate::shell::{self, CommandOptions, OutputObserver, SessionEnv, SESSION_MARKER};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Agent CLI invoked when none is configured.
pub const DEFAULT_AGENT_COMMAND: &str = "claude";

/// Process-spawning backend.
///
/// Agent invocations run in a nested session: the child receives an explicit
/// environment with the session marker removed, and a scratch directory that
/// is deleted before the call returns.
#[derive(Clone)]
pub struct CliBackend {
    agent_command: String,
    environment: SessionEnv,
    observer: Option<OutputObserver>,
}

impl CliBackend {
    /// Backend using the current process environment and the default agent CLI.
    pub fn new() -> Self {
        Self {
            agent_command: DEFAULT_AGENT_COMMAND.to_string(),
            environment: SessionEnv::capture(),
            observer: None,
        }
    }

    /// Use a different agent binary.
    pub fn with_agent_command(mut self, command: impl Into<String>) -> Self {
        self.agent_command = command.into();
        self
    }

    /// Base environment for agent processes.
    pub fn with_environment(mut self, environment: SessionEnv) -> Self {
        self.environment = environment;
        self
    }

    /// Receive output lines as they are produced.
    pub fn with_observer(mut self, observer: OutputObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn agent_command(&self) -> &str {
        &self.agent_command
    }

    /// Arguments passed to the agent CLI.
    pub fn agent_args(
        prompt: &str,
        system_prompt: Option<&str>,
        mode: Option<&str>,
    ) -> Vec<String> {
        let mut args = vec!["-p".to_string(), prompt.to_string()];
        if let Some(system_prompt) = system_prompt {
            args.push("--append-system-prompt".to_string());
            args.push(system_prompt.to_string());
        }
        if let Some(mode) = mode {
            args.push("--permission-mode".to_string());
            args.push(mode.to_string());
        }
        args
    }
}

impl Default for CliBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CliBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliBackend")
            .field("agent_command", &self.agent_command)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl ExecutionBackend for CliBackend {
    fn execute_bash_step(
        &self,
        command: &str,
        working_dir: Option<&Path>,
        timeout: Duration,
    ) -> Result<String, BackendError> {
        let options = CommandOptions {
            cwd: working_dir.map(Path::to_path_buf),
            timeout: Some(timeout),
            ..Default::default()
        };

        debug!("Running shell command: {}", command);
        let result = shell::execute(command, &options, self.observer.as_ref())?;
        debug!(
            "Shell command exited with {:?} in {:?}",
            result.exit_code, result.duration
        );

        if !result.success {
            return Err(BackendError::CommandFailed {
                command: command.to_string(),
                code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(result.stdout.trim().to_string())
    }

    fn execute_agent_step(
        &self,
        prompt: &str,
        agent_name: Option<&str>,
        agent_system_prompt: Option<&str>,
        mode: Option<&str>,
        working_dir: Option<&Path>,
    ) -> Result<String, BackendError> {
        let scratch = tempfile::Builder::new()
            .prefix("recipe-agent-")
            .tempdir()?;

        if self.environment.is_nested() {
            debug!("Clearing {} for the nested agent session", SESSION_MARKER);
        }
        let mut environment = self.environment.without_session_marker();
        let cwd = match working_dir {
            Some(dir) => {
                environment.set("TMPDIR", scratch.path().to_string_lossy().into_owned());
                dir.to_path_buf()
            }
            None => scratch.path().to_path_buf(),
        };

        let options = CommandOptions {
            cwd: Some(cwd),
            environment: Some(environment),
            ..Default::default()
        };
        let args = Self::agent_args(prompt, agent_system_prompt, mode);

        debug!(
            "Invoking agent {} via {}",
            agent_name.unwrap_or("(default)"),
            self.agent_command
        );
        let outcome = shell::execute_program(
            &self.agent_command,
            &args,
            &options,
            self.observer.as_ref(),
        );

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(
                "Failed to remove agent scratch directory {}: {}",
                scratch_path.display(),
                e
            );
        }

        let result = outcome?;
        if !result.success {
            let stderr = result.stderr.trim();
            let message = if stderr.is_empty() {
                format!("exited with code {:?}", result.exit_code)
            } else {
                format!("exited with code {:?}: {}", result.exit_code, stderr)
            };
            return Err(BackendError::AgentFailed {
                agent: agent_name.unwrap_or(&self.agent_command).to_string(),
                message,
            });
        }

        Ok(result.stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_args_minimal() {
        assert_eq!(CliBackend::agent_args("hi", None, None), vec!["-p", "hi"]);
    }

    #[test]
    fn agent_args_with_system_prompt_and_mode() {
        let args = CliBackend::agent_args("do it", Some("You review code."), Some("plan"));
        assert_eq!(
            args,
            vec![
                "-p",
                "do it",
                "--append-system-prompt",
                "You review code.",
                "--permission-mode",
                "plan"
            ]
        );
    }

    #[test]
    fn debug_omits_environment() {
        let backend = CliBackend::new().with_agent_command("my-agent");
        let rendered = format!("{:?}", backend);
        assert!(rendered.contains("my-agent"));
        assert!(!rendered.contains("PATH"));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::shell::SESSION_MARKER;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_agent(dir: &TempDir, body: &str) -> String {
            let path = dir.path().join("fake-agent");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn nested_env() -> SessionEnv {
            let mut env = SessionEnv::capture();
            env.set(SESSION_MARKER, "1");
            env
        }

        #[test]
        fn bash_returns_trimmed_stdout() {
            let backend = CliBackend::new();
            let out = backend
                .execute_bash_step("printf '  hi\\n\\n'", None, Duration::from_secs(10))
                .unwrap();
            assert_eq!(out, "hi");
        }

        #[test]
        fn bash_nonzero_exit_is_command_failed() {
            let backend = CliBackend::new();
            let err = backend
                .execute_bash_step("echo bad >&2; exit 4", None, Duration::from_secs(10))
                .unwrap_err();
            match err {
                BackendError::CommandFailed { code, stderr, .. } => {
                    assert_eq!(code, Some(4));
                    assert!(stderr.contains("bad"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn bash_respects_working_dir() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("here.txt"), "").unwrap();
            let backend = CliBackend::new();
            let out = backend
                .execute_bash_step("ls", Some(dir.path()), Duration::from_secs(10))
                .unwrap();
            assert_eq!(out, "here.txt");
        }

        #[test]
        fn bash_timeout() {
            let backend = CliBackend::new();
            let err = backend
                .execute_bash_step("sleep 5", None, Duration::from_millis(200))
                .unwrap_err();
            assert!(matches!(err, BackendError::Timeout { .. }));
        }

        #[test]
        fn agent_runs_without_session_marker_in_scratch_dir() {
            let bin = TempDir::new().unwrap();
            let agent = fake_agent(&bin, r#"echo "${CLAUDECODE:-absent}|$(pwd)|$*""#);
            let backend = CliBackend::new()
                .with_agent_command(agent)
                .with_environment(nested_env());

            let out = backend
                .execute_agent_step("hello", Some("helper"), None, None, None)
                .unwrap();
            let parts: Vec<&str> = out.splitn(3, '|').collect();

            assert_eq!(parts[0], "absent");
            assert!(parts[1].contains("recipe-agent-"));
            assert!(!Path::new(parts[1]).exists(), "scratch dir should be removed");
            assert_eq!(parts[2], "-p hello");
        }

        #[test]
        fn agent_with_working_dir_gets_scratch_tmpdir() {
            let bin = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let agent = fake_agent(&bin, r#"echo "$(pwd)|$TMPDIR""#);
            let backend = CliBackend::new().with_agent_command(agent);

            let out = backend
                .execute_agent_step("x", None, None, None, Some(work.path()))
                .unwrap();
            let (cwd, tmp) = out.split_once('|').unwrap();

            assert_eq!(
                Path::new(cwd).canonicalize().unwrap(),
                work.path().canonicalize().unwrap()
            );
            assert!(tmp.contains("recipe-agent-"));
            assert!(!Path::new(tmp).exists());
        }

        #[test]
        fn agent_failure_removes_scratch_and_reports_agent() {
            let bin = TempDir::new().unwrap();
            let agent = fake_agent(&bin, r#"pwd > "$0.cwd"; echo broke >&2; exit 2"#);
            let backend = CliBackend::new().with_agent_command(agent.clone());

            let err = backend
                .execute_agent_step("x", Some("reviewer"), None, None, None)
                .unwrap_err();
            match err {
                BackendError::AgentFailed { agent, message } => {
                    assert_eq!(agent, "reviewer");
                    assert!(message.contains("broke"));
                }
                other => panic!("unexpected error: {other:?}"),
            }

            let cwd = std::fs::read_to_string(format!("{}.cwd", agent)).unwrap();
            assert!(!Path::new(cwd.trim()).exists());
        }

        #[test]
        fn missing_agent_binary_is_spawn_error() {
            let backend = CliBackend::new().with_agent_command("no-such-agent-binary-xyz");
            let err = backend
                .execute_agent_step("x", None, None, None, None)
                .unwrap_err();
            assert!(matches!(err, BackendError::Spawn { .. }));
        }
    }
}
