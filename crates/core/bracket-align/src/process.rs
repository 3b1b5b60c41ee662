use crate::error::{AlignError, Result};
use bracket_config::types::DEFAULT_ALIGNER_BIN;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::debug;
use which::which;

/// How long a child whose output already closed gets to exit by itself
/// before it is sent `SIGTERM`.
const EXIT_GRACE: Duration = Duration::from_millis(200);

/// How a child process ended.
#[derive(Debug)]
pub enum ProcessExit {
    /// Exited on its own.
    Exited(ExitStatus),
    /// Exited after being sent `SIGTERM`.
    Terminated(ExitStatus),
    /// Still running when the wait bound ran out; it has been killed.
    TimedOut,
}

pub struct ProcessHandle {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl ProcessHandle {
    /// Spawn `program` with all three standard streams piped.
    pub fn spawn(program: &Path, args: &[OsString]) -> Result<Self> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| AlignError::SpawnError {
            command: program.display().to_string(),
            args: args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            source: e,
        })?;
        debug!("Spawned {} (pid {:?})", program.display(), child.id());

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AlignError::ProcessError {
                message: "Failed to capture stdout".to_string(),
            })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AlignError::ProcessError {
                message: "Failed to capture stderr".to_string(),
            })?;

        Ok(Self {
            child,
            stdout: Some(stdout),
            stderr: Some(stderr),
        })
    }

    /// Write the single newline the aligner waits for, then close stdin.
    ///
    /// A child that already exited without reading its input is not an
    /// error here; its exit status is inspected later.
    pub async fn send_start_signal(&mut self) -> Result<()> {
        let Some(mut stdin) = self.child.stdin.take() else {
            return Ok(());
        };

        let written = match stdin.write_all(b"\n").await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                debug!("Child closed stdin before the start signal");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// End the child once its output has been drained.
    ///
    /// A child that exits within a short grace period is reported as
    /// [`ProcessExit::Exited`]. Otherwise it is sent `SIGTERM` and awaited
    /// for at most `timeout`; past that it is killed and
    /// [`ProcessExit::TimedOut`] is returned.
    pub async fn finish(mut self, timeout: Duration) -> Result<ProcessExit> {
        if let Ok(status) = tokio::time::timeout(EXIT_GRACE, self.child.wait()).await {
            return Ok(ProcessExit::Exited(status?));
        }

        self.terminate()?;

        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(status) => Ok(ProcessExit::Terminated(status?)),
            Err(_) => {
                debug!("Child ignored SIGTERM for {:?}, killing", timeout);
                self.child.kill().await?;
                Ok(ProcessExit::TimedOut)
            }
        }
    }

    /// Send `SIGTERM` to the child.
    fn terminate(&mut self) -> Result<()> {
        // Already reaped
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = libc::pid_t::try_from(pid).map_err(|_| AlignError::ProcessError {
            message: format!("pid {pid} out of range"),
        })?;

        // SAFETY: `pid` belongs to our own child, which has not been reaped
        // yet (`Child::id` returns None after that), so it cannot refer to
        // an unrelated process.
        let result = unsafe { libc::kill(pid, libc::SIGTERM) };
        if result == 0 {
            return Ok(());
        }

        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        Err(AlignError::ProcessError {
            message: format!("Failed to send terminate signal: {err}"),
        })
    }
}

/// Locate the aligner executable.
///
/// An explicitly configured path is used as is (with tilde expansion); a
/// bare program name is searched for on `PATH`. Without configuration,
/// `img-aligner` is searched for on `PATH`.
pub async fn find_aligner(configured: Option<&Path>) -> Result<PathBuf> {
    let configured = configured.map(|p| expand_tilde(&p.to_string_lossy()));

    if let Some(path) = configured.as_ref()
        && path.components().count() > 1
    {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(AlignError::AlignerNotFoundAtPath { path: path.clone() });
    }

    let name = configured.map_or_else(
        || OsString::from(DEFAULT_ALIGNER_BIN),
        PathBuf::into_os_string,
    );
    tokio::task::spawn_blocking(move || {
        which(&name).map_err(|_| {
            if name == DEFAULT_ALIGNER_BIN {
                AlignError::AlignerNotFound
            } else {
                AlignError::AlignerNotFoundAtPath {
                    path: PathBuf::from(&name),
                }
            }
        })
    })
    .await
    .map_err(|_| AlignError::ProcessError {
        message: "Failed to spawn blocking task".to_string(),
    })?
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}
