//! Process execution for browser capabilities.
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between child status checks while waiting with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` if terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over running external programs.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    /// Run a program to completion, returning its output regardless of exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_unchecked(&self, program: &Path, args: &[String]) -> io::Result<ExecResult>;

    /// Run a program, killing it once `timeout` elapses.
    ///
    /// Returns `Ok(None)` if the process was killed.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or waited on.
    fn run_with_timeout(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> io::Result<Option<ExecResult>>;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(&self, program: &Path, args: &[String]) -> io::Result<ExecResult> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map(ExecResult::from)
    }

    fn run_with_timeout(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> io::Result<Option<ExecResult>> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = wait_until(&mut child, Instant::now() + timeout)? else {
            // Grandchildren may still hold the pipes open; leave the readers detached.
            return Ok(None);
        };

        Ok(Some(ExecResult {
            stdout: collect(stdout),
            stderr: collect(stderr),
            success: status.success(),
            code: status.code(),
        }))
    }
}

/// The parts of [`Child`] the deadline loop needs.
trait Waitable {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl Waitable for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Self::try_wait(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Self::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Self::wait(self)
    }
}

/// Poll `child` until it exits or `deadline` passes.
///
/// Returns `Ok(None)` if the child had to be killed.  The child is killed and
/// reaped before any error is returned.
fn wait_until<C: Waitable>(child: &mut C, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => break Ok(Some(status)),
            Ok(None) => {}
            Err(e) => {
                child.kill().ok();
                child.wait().ok();
                break Err(e);
            }
        }
        let now = Instant::now();
        if now >= deadline {
            child.kill().ok();
            break child.wait().map(|_| None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).ok();
        }
        buf
    })
}

fn collect(handle: JoinHandle<Vec<u8>>) -> String {
    let bytes = handle.join().unwrap_or_default();
    String::from_utf8_lossy(&bytes).to_string()
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn run_unchecked_captures_stdout() {
        let result = SystemExecutor
            .run_unchecked(Path::new("echo"), &args(&["hello"]))
            .unwrap();
        assert!(result.success, "echo should succeed");
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.code, Some(0));
    }

    #[test]
    fn run_unchecked_reports_failure() {
        let result = SystemExecutor
            .run_unchecked(Path::new("false"), &[])
            .unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
        assert_eq!(result.code, Some(1));
    }

    #[test]
    fn run_unchecked_missing_program_errors() {
        let err = SystemExecutor
            .run_unchecked(Path::new("this-program-does-not-exist-12345"), &[])
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn run_with_timeout_returns_output_when_finished_in_time() {
        let result = SystemExecutor
            .run_with_timeout(
                Path::new("sh"),
                &args(&["-c", "echo out; echo err >&2; exit 3"]),
                Duration::from_secs(10),
            )
            .unwrap()
            .expect("command should finish before the timeout");
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
        assert_eq!(result.code, Some(3));
        assert!(!result.success);
    }

    #[test]
    fn run_with_timeout_kills_slow_process() {
        let start = Instant::now();
        let result = SystemExecutor
            .run_with_timeout(
                Path::new("sleep"),
                &args(&["5"]),
                Duration::from_millis(200),
            )
            .unwrap();
        assert!(result.is_none(), "slow process should time out");
        assert!(
            start.elapsed() < Duration::from_secs(4),
            "timed-out process should be killed promptly"
        );
    }

    // -----------------------------------------------------------------------
    // wait_until
    // -----------------------------------------------------------------------

    use std::os::unix::process::ExitStatusExt as _;

    #[derive(Default)]
    struct FailingChild {
        killed: bool,
        reaped: bool,
    }

    impl Waitable for FailingChild {
        fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
            Err(io::Error::other("wait failed"))
        }

        fn kill(&mut self) -> io::Result<()> {
            self.killed = true;
            Ok(())
        }

        fn wait(&mut self) -> io::Result<ExitStatus> {
            self.reaped = true;
            Ok(ExitStatus::from_raw(0))
        }
    }

    #[test]
    fn wait_until_kills_child_when_polling_fails() {
        let mut child = FailingChild::default();
        let err = wait_until(&mut child, Instant::now() + Duration::from_secs(10)).unwrap_err();
        assert_eq!(err.to_string(), "wait failed");
        assert!(child.killed, "child must be killed on error");
        assert!(child.reaped, "child must be reaped on error");
    }
}
