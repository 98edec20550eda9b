//! A launched child process and the background task that watches it.
//!
//! The task reads stdout and stderr as data becomes ready and publishes every
//! chunk as the latest message of the session's `CompletionHandle`. Once the
//! child has exited and the pipes are drained it waits a short delay, then
//! finishes the handle with the exit code.

use crate::pending::CompletionHandle;
use crate::process::command_line::CommandLine;
use crate::process::error::ProcessError;
use chrono::{DateTime, Utc};
use psgcp_protocol::process_models::{SessionInfo, EXIT_CODE_UNAVAILABLE};
use psgcp_protocol::result_models::OperationOutcome;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

const READ_CHUNK_SIZE: usize = 8192;

/// How long to keep draining after exit when a descendant holds the pipes open.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Launch options for a [`ProcessSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Delay between observing the exit and reporting the exit code.
    pub exit_status_delay: Duration,

    /// Working directory of the child; inherited when `None`.
    pub working_dir: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            exit_status_delay: Duration::from_millis(500),
            working_dir: None,
        }
    }
}

/// A running (or finished) external process.
///
/// The session exclusively owns the child's input pipe; the background task
/// owns the child and its output pipes. Dropping the session cancels the
/// task, which kills the child.
#[derive(Debug)]
pub struct ProcessSession {
    command: CommandLine,
    info: SessionInfo,
    stdin: Option<ChildStdin>,
    completion: CompletionHandle,
    running: Arc<AtomicBool>,
    terminated: bool,
    task: Option<JoinHandle<()>>,
}

impl ProcessSession {
    /// Spawn `command` and start watching it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` if the program is empty, the process could not
    /// be created, or one of its pipes could not be captured.
    pub fn launch(
        command: CommandLine,
        completion: CompletionHandle,
        options: SessionOptions,
    ) -> Result<Self, ProcessError> {
        if command.program().trim().is_empty() {
            return Err(ProcessError::EmptyProgram);
        }

        let mut cmd = Command::new(command.program());
        cmd.args(command.args());
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        if let Some(dir) = &options.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: command.program().to_string(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessError::PipeUnavailable("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProcessError::PipeUnavailable("stderr"))?;
        let stdin = child.stdin.take();

        let info = SessionInfo {
            pid: child.id(),
            command_line: command.to_string(),
            started_at: Utc::now(),
        };
        debug!(pid = ?info.pid, command = %info.command_line, "launched process");

        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(watch_process(
            child,
            stdout,
            stderr,
            completion.clone(),
            Arc::clone(&running),
            options.exit_status_delay,
        ));

        Ok(Self {
            command,
            info,
            stdin,
            completion,
            running,
            terminated: false,
            task: Some(task),
        })
    }

    pub fn command(&self) -> &CommandLine {
        &self.command
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn pid(&self) -> Option<u32> {
        self.info.pid
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.info.started_at
    }

    pub fn completion(&self) -> &CompletionHandle {
        &self.completion
    }

    /// Whether the session may still produce output.
    ///
    /// Stays `true` after the child exits until its pipes are drained, so no
    /// data is published once this returns `false`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The most recent output chunk, if any was read.
    pub fn last_message(&self) -> Option<String> {
        self.completion.latest_message()
    }

    /// The reported exit code, once the exit has been delivered.
    pub fn exit_code(&self) -> Option<i32> {
        match self.completion.outcome() {
            Some(OperationOutcome::ProcessExited { code }) => Some(code),
            _ => None,
        }
    }

    /// Write `data` to the child's standard input.
    pub async fn write_input(&mut self, data: &[u8]) -> Result<(), ProcessError> {
        let stdin = self.stdin.as_mut().ok_or(ProcessError::Terminated)?;
        stdin.write_all(data).await.map_err(ProcessError::Write)?;
        stdin.flush().await.map_err(ProcessError::Write)
    }

    /// Close the child's standard input so it observes end of file.
    pub fn close_input(&mut self) {
        self.stdin = None;
    }

    /// Close the pipes and kill the child.
    ///
    /// The pending operation ends as cancelled rather than exited. Returns
    /// `false` if the session had already been terminated.
    pub fn terminate(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        self.terminated = true;
        self.stdin = None;
        if self.completion.cancel() {
            debug!(pid = ?self.info.pid, "terminating process");
        }
        true
    }

    /// Wait for the background task to finish and return the exit code.
    ///
    /// `None` when the session was terminated before the exit was reported.
    pub async fn wait(mut self) -> Option<i32> {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "process watcher task failed");
            }
        }
        self.exit_code()
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        if !self.terminated {
            self.completion.cancel();
        }
    }
}

enum Pipe {
    Stdout,
    Stderr,
}

enum Step {
    Read(Pipe, std::io::Result<usize>),
    Exited(std::io::Result<ExitStatus>),
    DrainDeadline,
    Cancelled,
}

async fn read_chunk<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

async fn watch_process(
    mut child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    completion: CompletionHandle,
    running: Arc<AtomicBool>,
    exit_status_delay: Duration,
) {
    let cancel = completion.cancellation();
    let mut stdout = Some(stdout);
    let mut stderr = Some(stderr);
    let mut out_buf = vec![0u8; READ_CHUNK_SIZE];
    let mut err_buf = vec![0u8; READ_CHUNK_SIZE];
    let mut exit_status: Option<std::io::Result<ExitStatus>> = None;
    let mut drain_deadline: Option<Instant> = None;

    while exit_status.is_none() || stdout.is_some() || stderr.is_some() {
        let step = tokio::select! {
            _ = cancel.cancelled() => Step::Cancelled,
            read = read_chunk(&mut stdout, &mut out_buf) => Step::Read(Pipe::Stdout, read),
            read = read_chunk(&mut stderr, &mut err_buf) => Step::Read(Pipe::Stderr, read),
            status = child.wait(), if exit_status.is_none() => Step::Exited(status),
            _ = sleep_until_deadline(drain_deadline) => Step::DrainDeadline,
        };

        match step {
            Step::Cancelled => {
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "kill after cancel failed; process likely gone");
                }
                if let Err(e) = child.wait().await {
                    debug!(error = %e, "reap after cancel failed");
                }
                running.store(false, Ordering::Release);
                return;
            }
            Step::Read(pipe, Ok(0)) | Step::Read(pipe, Err(_)) => match pipe {
                Pipe::Stdout => stdout = None,
                Pipe::Stderr => stderr = None,
            },
            Step::Read(pipe, Ok(n)) => {
                let buf = match pipe {
                    Pipe::Stdout => &out_buf,
                    Pipe::Stderr => &err_buf,
                };
                let message = String::from_utf8_lossy(&buf[..n]).into_owned();
                completion.publish_data(message);
            }
            Step::Exited(status) => {
                drain_deadline = Some(Instant::now() + PIPE_DRAIN_GRACE);
                exit_status = Some(status);
            }
            Step::DrainDeadline => {
                debug!("pipes still open after exit; stop draining");
                stdout = None;
                stderr = None;
            }
        }
    }

    running.store(false, Ordering::Release);

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(exit_status_delay) => {}
    }

    let code = match exit_status {
        Some(Ok(status)) => status.code().unwrap_or(EXIT_CODE_UNAVAILABLE),
        Some(Err(e)) => {
            warn!(error = %e, "failed to retrieve exit code");
            EXIT_CODE_UNAVAILABLE
        }
        None => EXIT_CODE_UNAVAILABLE,
    };
    debug!(code, "process exited");
    completion.finish(OperationOutcome::ProcessExited { code });
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use psgcp_protocol::operation_models::OperationStatus;

    fn fast_options() -> SessionOptions {
        SessionOptions {
            exit_status_delay: Duration::from_millis(20),
            working_dir: None,
        }
    }

    #[tokio::test]
    async fn test_launch_empty_program() {
        let result = ProcessSession::launch(
            CommandLine::new("", Vec::<String>::new()),
            CompletionHandle::new(),
            fast_options(),
        );
        assert!(matches!(result, Err(ProcessError::EmptyProgram)));
    }

    #[tokio::test]
    async fn test_launch_missing_program() {
        let result = ProcessSession::launch(
            CommandLine::new("nonexistent-command-xyz123", Vec::<String>::new()),
            CompletionHandle::new(),
            fast_options(),
        );

        match result {
            Err(ProcessError::Spawn { program, .. }) => {
                assert_eq!(program, "nonexistent-command-xyz123")
            }
            other => panic!("Expected Spawn error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let session = ProcessSession::launch(
            CommandLine::new("sh", ["-c", "exit 3"]),
            CompletionHandle::new(),
            fast_options(),
        )
        .expect("Should launch");

        let code = tokio::time::timeout(Duration::from_secs(10), session.wait())
            .await
            .expect("Should exit in time");
        assert_eq!(code, Some(3));
    }

    #[tokio::test]
    async fn test_output_is_published() {
        let completion = CompletionHandle::new();
        let session = ProcessSession::launch(
            CommandLine::new("echo", ["hello world"]),
            completion.clone(),
            fast_options(),
        )
        .expect("Should launch");

        let code = tokio::time::timeout(Duration::from_secs(10), session.wait())
            .await
            .expect("Should exit in time");

        assert_eq!(code, Some(0));
        assert_eq!(
            completion.latest_message().map(|m| m.trim_end().to_string()),
            Some("hello world".to_string())
        );
    }

    #[tokio::test]
    async fn test_stderr_is_merged() {
        let completion = CompletionHandle::new();
        let session = ProcessSession::launch(
            CommandLine::new("sh", ["-c", "echo oops >&2"]),
            completion.clone(),
            fast_options(),
        )
        .expect("Should launch");

        tokio::time::timeout(Duration::from_secs(10), session.wait())
            .await
            .expect("Should exit in time");
        assert_eq!(
            completion.latest_message().map(|m| m.trim_end().to_string()),
            Some("oops".to_string())
        );
    }

    #[tokio::test]
    async fn test_write_input_reaches_child() {
        let completion = CompletionHandle::new();
        let mut session = ProcessSession::launch(
            CommandLine::new("cat", Vec::<String>::new()),
            completion.clone(),
            fast_options(),
        )
        .expect("Should launch");

        session.write_input(b"ping\n").await.expect("Should write");
        session.close_input();

        let code = tokio::time::timeout(Duration::from_secs(10), session.wait())
            .await
            .expect("Should exit in time");
        assert_eq!(code, Some(0));
        assert_eq!(completion.latest_message(), Some("ping\n".to_string()));
    }

    #[tokio::test]
    async fn test_terminate_kills_and_cancels() {
        let completion = CompletionHandle::new();
        let mut session = ProcessSession::launch(
            CommandLine::new("sleep", ["30"]),
            completion.clone(),
            fast_options(),
        )
        .expect("Should launch");
        assert!(session.is_running());

        assert!(session.terminate());
        assert!(!session.terminate());
        assert!(matches!(
            session.write_input(b"x").await,
            Err(ProcessError::Terminated)
        ));

        let running = Arc::clone(&session.running);
        let code = tokio::time::timeout(Duration::from_secs(10), session.wait())
            .await
            .expect("Should stop in time");

        assert_eq!(code, None);
        assert!(!running.load(Ordering::Acquire));
        assert_eq!(completion.status(), OperationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_drop_cancels_session() {
        let completion = CompletionHandle::new();
        let session = ProcessSession::launch(
            CommandLine::new("sleep", ["30"]),
            completion.clone(),
            fast_options(),
        )
        .expect("Should launch");

        drop(session);
        assert!(completion.is_cancelled());
    }

    #[tokio::test]
    async fn test_no_data_published_after_not_running() {
        let completion = CompletionHandle::new();
        let session = ProcessSession::launch(
            CommandLine::new("sh", ["-c", "(sleep 0.1; echo late) & exit 0"]),
            completion.clone(),
            fast_options(),
        )
        .expect("Should launch");

        let deadline = Instant::now() + Duration::from_secs(10);
        while session.is_running() {
            assert!(Instant::now() < deadline, "session never stopped running");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // Whatever was read before the drain ended has been published by now
        let drained = completion.take_data();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(completion.take_data(), None);
        assert_eq!(drained.as_deref(), Some("late\n"));
    }
}
