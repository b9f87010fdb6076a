//! Process execution with timeouts and streaming output.

use crate::error::BackendError;
use crate::shell::session::SessionEnv;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    fn from_status(status: ExitStatus, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
            success: status.success(),
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Complete child environment. When `None` the parent's environment is
    /// inherited.
    pub environment: Option<SessionEnv>,

    /// Extra variables layered on top of the environment.
    pub env: HashMap<String, String>,

    /// Kill the process after this long (None = no timeout).
    pub timeout: Option<Duration>,
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Observer for streamed output lines.
pub type OutputObserver = Arc<dyn Fn(OutputLine) + Send + Sync>;

/// Execute a shell command line through the platform shell.
pub fn execute(
    command: &str,
    options: &CommandOptions,
    observer: Option<&OutputObserver>,
) -> Result<CommandResult, BackendError> {
    let (shell, flag) = shell_invocation();
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command);
    run(cmd, command, options, observer)
}

/// Execute a program directly with arguments (no shell).
pub fn execute_program(
    program: &str,
    args: &[String],
    options: &CommandOptions,
    observer: Option<&OutputObserver>,
) -> Result<CommandResult, BackendError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    run(cmd, program, options, observer)
}

fn run(
    mut cmd: Command,
    display: &str,
    options: &CommandOptions,
    observer: Option<&OutputObserver>,
) -> Result<CommandResult, BackendError> {
    let start = Instant::now();

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    if let Some(environment) = &options.environment {
        environment.apply(&mut cmd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let program = cmd.get_program().to_string_lossy().to_string();
    let mut child = cmd
        .spawn()
        .map_err(|source| BackendError::Spawn { program, source })?;

    let (tx, rx) = mpsc::channel();
    let stdout_handle = child
        .stdout
        .take()
        .map(|out| spawn_reader(out, tx.clone(), OutputLine::Stdout));
    let stderr_handle = child
        .stderr
        .take()
        .map(|err| spawn_reader(err, tx, OutputLine::Stderr));

    // A timeout too large to represent as an instant means no deadline.
    let deadline = options.timeout.and_then(|t| start.checked_add(t));

    // Forward lines until both pipes close or the deadline passes.
    loop {
        let received = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(kill_timed_out(&mut child, display, options));
                }
                rx.recv_timeout(deadline - now)
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(line) => {
                if let Some(observer) = observer {
                    observer(line);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(kill_timed_out(&mut child, display, options));
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let status = wait_until(&mut child, deadline)?;
    let Some(status) = status else {
        return Err(kill_timed_out(&mut child, display, options));
    };

    let stdout = stdout_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    Ok(CommandResult::from_status(
        status,
        stdout,
        stderr,
        start.elapsed(),
    ))
}

fn spawn_reader<R>(
    pipe: R,
    tx: mpsc::Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        let mut output = String::new();
        for line in reader.lines().map_while(std::result::Result::ok) {
            output.push_str(&line);
            output.push('\n');
            let _ = tx.send(wrap(line));
        }
        output
    })
}

/// Wait for exit, giving up at `deadline`. `Ok(None)` means the deadline passed.
fn wait_until(
    child: &mut Child,
    deadline: Option<Instant>,
) -> Result<Option<ExitStatus>, BackendError> {
    let Some(deadline) = deadline else {
        return Ok(Some(child.wait()?));
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn kill_timed_out(child: &mut Child, display: &str, options: &CommandOptions) -> BackendError {
    let _ = child.kill();
    let _ = child.wait();
    BackendError::Timeout {
        command: display.to_string(),
        timeout: options.timeout.unwrap_or_default(),
    }
}

/// Shell executable and the flag that passes it a command string.
fn shell_invocation() -> (String, &'static str) {
    if cfg!(target_os = "windows") {
        (
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            "/C",
        )
    } else {
        ("/bin/sh".to_string(), "-c")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn execute_successful_command() {
        let result = execute("echo hello", &CommandOptions::default(), None).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "hello\n");
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("echo oops >&2; exit 3", &CommandOptions::default(), None).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.contains("oops"));
    }

    #[test]
    fn execute_with_env() {
        let mut options = CommandOptions::default();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let result = execute("echo $MY_VAR", &options, None).unwrap();
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn explicit_environment_replaces_parent() {
        let environment = SessionEnv::from_vars([("ONLY_THIS", "yes")]);
        let options = CommandOptions {
            environment: Some(environment),
            ..Default::default()
        };

        let result = execute("echo \"$ONLY_THIS:${HOME:-unset}\"", &options, None).unwrap();
        assert_eq!(result.stdout.trim(), "yes:unset");
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        let result = execute("touch marker", &options, None).unwrap();
        assert!(result.success);
        assert!(temp.path().join("marker").exists());
    }

    #[test]
    fn timeout_kills_long_command() {
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };

        let started = Instant::now();
        let err = execute("sleep 5", &options, None).unwrap_err();

        assert!(matches!(err, BackendError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn fast_command_finishes_within_timeout() {
        let options = CommandOptions {
            timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let result = execute("echo quick", &options, None).unwrap();
        assert!(result.success);
    }

    #[test]
    fn unrepresentable_timeout_runs_without_deadline() {
        let options = CommandOptions {
            timeout: Some(Duration::from_secs(u64::MAX)),
            ..Default::default()
        };
        let result = execute("echo unbounded", &options, None).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "unbounded");
    }

    #[test]
    fn observer_receives_both_streams() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let observer: OutputObserver = Arc::new(move |line| sink.lock().unwrap().push(line));

        execute(
            "echo out; echo err >&2",
            &CommandOptions::default(),
            Some(&observer),
        )
        .unwrap();

        let captured = lines.lock().unwrap();
        assert!(captured.contains(&OutputLine::Stdout("out".to_string())));
        assert!(captured.contains(&OutputLine::Stderr("err".to_string())));
    }

    #[test]
    fn execute_program_passes_arguments_verbatim() {
        let args = vec!["a; echo injected".to_string()];
        let result = execute_program("echo", &args, &CommandOptions::default(), None).unwrap();
        assert_eq!(result.stdout, "a; echo injected\n");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = execute_program(
            "definitely-not-a-real-binary-xyz",
            &[],
            &CommandOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
    }
}
