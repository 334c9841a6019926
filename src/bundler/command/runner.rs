//! External process execution with captured output.

use super::Templates;
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::{ExitWait, RunnerSettings};
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

/// What to do when a command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return [`Error::Command`] with the captured output.
    #[default]
    Fatal,
    /// Log a warning and return the output.
    Ignore,
}

/// Result of one command invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when it couldn't be observed
    pub exit_code: Option<i32>,
    /// stdout and stderr lines in arrival order
    pub lines: Vec<String>,
    /// Non-zero exit or anything written to stderr
    pub failed: bool,
}

impl CommandOutput {
    /// Captured output as one string.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Runs shell command lines, draining stdout and stderr concurrently.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    exit_wait: ExitWait,
    poll_interval: Duration,
    max_exit_wait: Duration,
    templates: Templates,
}

impl CommandRunner {
    /// Creates a runner from the `[runner]` settings.
    pub fn new(settings: &RunnerSettings) -> Self {
        Self {
            exit_wait: settings.exit_wait,
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
            max_exit_wait: Duration::from_millis(settings.max_exit_wait_ms),
            templates: Templates::new(),
        }
    }

    /// Template registry used for command lines.
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Renders `template` with `data` and runs the result.
    pub async fn run_template<T: Serialize>(
        &self,
        template: &str,
        data: &T,
        working_dir: Option<&Path>,
        policy: ErrorPolicy,
    ) -> Result<CommandOutput> {
        let command = self.templates.render(template, data)?;
        self.run(&command, working_dir, policy).await
    }

    /// Runs one shell command line.
    ///
    /// A non-zero exit code or any stderr output marks the run failed. An
    /// exit that couldn't be observed is recorded as `exit_code: None` and
    /// judged by stderr alone. Under [`ErrorPolicy::Fatal`] a failure is returned as
    /// [`Error::Command`].
    pub async fn run(
        &self,
        command: &str,
        working_dir: Option<&Path>,
        policy: ErrorPolicy,
    ) -> Result<CommandOutput> {
        log::info!("Execute cmd: {command}");
        if let Some(dir) = working_dir {
            log::debug!("  in {}", dir.display());
        }

        let mut cmd = shell_command(command);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| Error::Command {
            command: command.to_string(),
            exit_code: None,
            output: format!("failed to spawn: {e}"),
        })?;

        let lines = Mutex::new(Vec::new());
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both streams must reach EOF before the exit is examined.
        let (_, stderr_lines) = tokio::join!(drain(stdout, &lines), drain(stderr, &lines));

        let exit = match self.exit_wait {
            ExitWait::Signal => match child.wait().await {
                Ok(status) => Exit::Observed(status.code()),
                Err(e) => {
                    log::warn!("Couldn't wait for {command}: {e}");
                    Exit::Unobserved
                }
            },
            ExitWait::PollPid => self.poll_exit(&mut child).await,
        };

        let lines = lines.into_inner().unwrap_or_default();
        let (exit_code, exit_failed) = match exit {
            Exit::Observed(code) => (code, code != Some(0)),
            Exit::Unobserved => (None, false),
        };
        let failed = exit_failed || stderr_lines > 0;
        let output = CommandOutput {
            exit_code,
            lines,
            failed,
        };

        let text = output.text();
        if !failed {
            log::debug!("=== CMD Output begin\n{text}\n=== CMD Output end");
            return Ok(output);
        }

        match policy {
            ErrorPolicy::Fatal => {
                log::error!(
                    "Command failed (exit code {exit_code:?}): {command}\n=== CMD Output begin\n{text}\n=== CMD Output end"
                );
                Err(Error::Command {
                    command: command.to_string(),
                    exit_code,
                    output: text,
                })
            }
            ErrorPolicy::Ignore => {
                log::warn!(
                    "Command reported errors, ignored (exit code {exit_code:?}): {command}\n=== CMD Output begin\n{text}\n=== CMD Output end"
                );
                Ok(output)
            }
        }
    }

    /// Polls the child until it exits, is gone, or the bounded wait expires.
    ///
    /// On expiry the wait is abandoned and the process left alone.
    async fn poll_exit(&self, child: &mut Child) -> Exit {
        let Some(pid) = child.id() else {
            return match child.try_wait() {
                Ok(Some(status)) => Exit::Observed(status.code()),
                _ => Exit::Unobserved,
            };
        };
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        let started = Instant::now();

        loop {
            if let Ok(Some(status)) = child.try_wait() {
                return Exit::Observed(status.code());
            }
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            if system.process(pid).is_none() {
                // It may have exited between the two checks.
                if let Ok(Some(status)) = child.try_wait() {
                    return Exit::Observed(status.code());
                }
                log::warn!("Process {pid} is gone, exit code unknown");
                return Exit::Unobserved;
            }
            if started.elapsed() >= self.max_exit_wait {
                log::warn!(
                    "Process {pid} still alive {}ms after its output closed, force end of wait",
                    self.max_exit_wait.as_millis()
                );
                return Exit::Unobserved;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// How the child's exit was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Exit status collected; `None` when terminated by a signal
    Observed(Option<i32>),
    /// Wait abandoned or the process vanished unreaped
    Unobserved,
}

/// Reads lines into `sink` until EOF, returning how many were read.
async fn drain<R: AsyncRead + Unpin>(reader: Option<R>, sink: &Mutex<Vec<String>>) -> usize {
    let Some(reader) = reader else {
        return 0;
    };
    let mut lines = BufReader::new(reader).lines();
    let mut count = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        if let Ok(mut sink) = sink.lock() {
            sink.push(line);
        }
        count += 1;
    }
    count
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner(exit_wait: ExitWait) -> CommandRunner {
        runner_with_wait(exit_wait, 1000)
    }

    fn runner_with_wait(exit_wait: ExitWait, max_exit_wait_ms: u64) -> CommandRunner {
        CommandRunner::new(&RunnerSettings {
            exit_wait,
            poll_interval_ms: 20,
            max_exit_wait_ms,
        })
    }

    #[tokio::test]
    async fn captures_stdout_lines() {
        let out = runner(ExitWait::Signal)
            .run("echo one; echo two", None, ErrorPolicy::Fatal)
            .await
            .unwrap();
        assert_eq!(out.lines, vec!["one", "two"]);
        assert_eq!(out.exit_code, Some(0));
        assert!(!out.failed);
    }

    #[tokio::test]
    async fn stderr_with_zero_exit_fails_under_fatal() {
        let err = runner(ExitWait::Signal)
            .run("echo oops >&2; exit 0", None, ErrorPolicy::Fatal)
            .await
            .unwrap_err();
        match err {
            Error::Command {
                exit_code, output, ..
            } => {
                assert_eq!(exit_code, Some(0));
                assert!(output.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn stderr_with_zero_exit_is_returned_under_ignore() {
        let out = runner(ExitWait::Signal)
            .run("echo oops >&2; exit 0", None, ErrorPolicy::Ignore)
            .await
            .unwrap();
        assert!(out.failed);
        assert_eq!(out.lines, vec!["oops"]);
    }

    #[tokio::test]
    async fn non_zero_exit_fails() {
        let err = runner(ExitWait::Signal)
            .run("exit 3", None, ErrorPolicy::Fatal)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command { exit_code: Some(3), .. }));
    }

    #[tokio::test]
    async fn poll_pid_observes_exit_code() {
        let out = runner(ExitWait::PollPid)
            .run("echo done", None, ErrorPolicy::Fatal)
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(0));
    }

    #[tokio::test]
    async fn poll_pid_expiry_proceeds_with_unknown_exit() {
        // Output closes long before the process exits.
        let started = Instant::now();
        let out = runner_with_wait(ExitWait::PollPid, 200)
            .run("echo built; exec >&- 2>&-; sleep 3", None, ErrorPolicy::Fatal)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(out.exit_code, None);
        assert_eq!(out.lines, vec!["built"]);
        assert!(!out.failed);
    }

    #[tokio::test]
    async fn poll_pid_still_reports_non_zero_exit() {
        let err = runner(ExitWait::PollPid)
            .run("exit 4", None, ErrorPolicy::Fatal)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command { exit_code: Some(4), .. }));
    }

    #[tokio::test]
    async fn runs_in_working_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker.txt"), "").unwrap();
        let out = runner(ExitWait::Signal)
            .run("ls", Some(tmp.path()), ErrorPolicy::Fatal)
            .await
            .unwrap();
        assert!(out.lines.iter().any(|l| l == "marker.txt"));
    }

    #[tokio::test]
    async fn templates_are_rendered() {
        let data = std::collections::BTreeMap::from([("word", "hello")]);
        let out = runner(ExitWait::Signal)
            .run_template("echo {{word}}", &data, None, ErrorPolicy::Fatal)
            .await
            .unwrap();
        assert_eq!(out.lines, vec!["hello"]);
    }
}
