//! Runs the external aligner for one chain step.

use crate::error::{AlignError, Result};
use crate::process::{ProcessExit, ProcessHandle};
use crate::relay::{format_block, read_until_nul, relay_live};
use crate::types::PlanStep;
use bracket_config::{AlignerConfig, TuningParams};
use std::ffi::OsString;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of a completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,

    /// Whether the aligner had to be sent `SIGTERM` after its output closed.
    pub terminated: bool,

    /// Bytes the aligner wrote to standard error.
    pub stderr_bytes: usize,
}

/// Builds aligner command lines and runs them.
#[derive(Debug, Clone)]
pub struct AlignerInvoker {
    program: PathBuf,
    headless_flag: String,
    tuning_args: Vec<String>,
    extra_args: Vec<String>,
    exit_timeout: Duration,
}

impl AlignerInvoker {
    pub fn new(program: PathBuf, aligner: &AlignerConfig, tuning: &TuningParams) -> Self {
        Self {
            program,
            headless_flag: aligner.headless_flag.clone(),
            tuning_args: tuning.to_args(),
            extra_args: aligner.extra_args.clone(),
            exit_timeout: Duration::from_secs(aligner.exit_timeout_secs),
        }
    }

    /// Override the bound on waiting for the aligner to exit.
    #[must_use]
    pub fn with_exit_timeout(mut self, timeout: Duration) -> Self {
        self.exit_timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for `step`: headless flag, base, target, output,
    /// multiplier, the tuning flags, then any extra arguments.
    pub fn args_for(&self, step: &PlanStep) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(10 + self.tuning_args.len());
        if !self.headless_flag.is_empty() {
            args.push(self.headless_flag.clone().into());
        }
        args.push("-b".into());
        args.push(step.base.path().into());
        args.push("-t".into());
        args.push(step.target_path.clone().into());
        args.push("-o".into());
        args.push(step.output_path.clone().into());
        args.push("--base-mul".into());
        args.push(step.multiplier.to_string().into());
        args.extend(self.tuning_args.iter().map(OsString::from));
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    /// Run the aligner for `step`, relaying its output to `console`.
    ///
    /// Standard output is echoed live while standard error is drained
    /// concurrently and printed once standard output has ended. Text on
    /// standard error alone never fails the step; a non-zero exit status
    /// or a child that cannot be stopped does.
    pub async fn run<W: Write>(&self, step: &PlanStep, console: &mut W) -> Result<StepReport> {
        let args = self.args_for(step);
        debug!("Running {} {:?}", self.program.display(), args);

        let started = Instant::now();
        let mut process = ProcessHandle::spawn(&self.program, &args)?;
        info!("Step {}: aligner pid {:?}", step.index, process.id());
        process.send_start_signal().await?;

        let stdout = process
            .take_stdout()
            .ok_or_else(|| AlignError::ProcessError {
                message: "No stdout reader".to_string(),
            })?;
        let stderr = process
            .take_stderr()
            .ok_or_else(|| AlignError::ProcessError {
                message: "No stderr reader".to_string(),
            })?;

        // Drained alongside stdout so a chatty stderr cannot fill its pipe
        let stderr_task = tokio::spawn(read_until_nul(stderr));

        relay_live(stdout, console).await?;

        let stderr_content = stderr_task.await.map_err(|e| AlignError::ProcessError {
            message: format!("stderr reader failed: {e}"),
        })??;
        if let Some(block) = format_block(&stderr_content) {
            console.write_all(block.as_bytes())?;
            console.flush()?;
        }

        let exit = process.finish(self.exit_timeout).await?;
        let elapsed = started.elapsed();

        let terminated = match exit {
            ProcessExit::Exited(status) if status.success() => false,
            ProcessExit::Exited(status) => return Err(exit_error(status)),
            ProcessExit::Terminated(status) => {
                debug!("Aligner stopped by SIGTERM ({})", status);
                true
            }
            ProcessExit::TimedOut => {
                return Err(AlignError::ExitTimeout {
                    output: step.output_path.clone(),
                    timeout: self.exit_timeout,
                });
            }
        };

        if !step.output_path.exists() {
            warn!(
                "Aligner finished but {} was not written",
                step.output_path.display()
            );
        }

        Ok(StepReport {
            elapsed,
            terminated,
            stderr_bytes: stderr_content.len(),
        })
    }
}

/// Describe an unsuccessful exit the aligner reached by itself.
fn exit_error(status: ExitStatus) -> AlignError {
    match (status.code(), status.signal()) {
        (Some(code), _) => AlignError::AlignerFailed { code },
        (None, Some(signal)) => AlignError::AlignerKilled { signal },
        (None, None) => AlignError::AlignerFailed { code: -1 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageRecord;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-aligner");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn step(dir: &Path) -> PlanStep {
        PlanStep {
            index: 1,
            base: ImageRecord::new(dir.join("EXP 4 b.exr"), 4.0),
            target: ImageRecord::new(dir.join("EXP 8 a.exr"), 8.0),
            target_path: dir.join("EXP 8 a.exr"),
            output_path: dir.join("EXP 4 b (aligned).exr"),
            multiplier: 2.0,
        }
    }

    fn invoker(program: PathBuf) -> AlignerInvoker {
        AlignerInvoker::new(program, &AlignerConfig::default(), &TuningParams::default())
    }

    fn lossy(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_args_layout() {
        let dir = Path::new("/shots");
        let args = lossy(&invoker("img-aligner".into()).args_for(&step(dir)));
        assert_eq!(
            args[..9],
            [
                "--cli",
                "-b",
                "/shots/EXP 4 b.exr",
                "-t",
                "/shots/EXP 8 a.exr",
                "-o",
                "/shots/EXP 4 b (aligned).exr",
                "--base-mul",
                "2",
            ]
        );
        assert_eq!(args[9..], TuningParams::default().to_args()[..]);
    }

    #[test]
    fn test_extra_args_come_last() {
        let config = AlignerConfig {
            extra_args: vec!["--grid-res-x".into(), "64".into()],
            ..AlignerConfig::default()
        };
        let invoker = AlignerInvoker::new("img-aligner".into(), &config, &TuningParams::default());
        let args = lossy(&invoker.args_for(&step(Path::new("/shots"))));
        assert_eq!(args[args.len() - 2..], ["--grid-res-x", "64"]);
    }

    #[test]
    fn test_fractional_multiplier_is_exact() {
        let mut s = step(Path::new("/shots"));
        s.multiplier = 1.0 / 3.0;
        let args = lossy(&invoker("img-aligner".into()).args_for(&s));
        let parsed: f64 = args[8].parse().unwrap();
        assert_eq!(parsed, 1.0 / 3.0);
    }

    #[tokio::test]
    #[serial]
    async fn test_run_relays_output() {
        let tmp = TempDir::new().unwrap();
        let prog = script(
            tmp.path(),
            "read go\necho 'warping'\necho 'cost 0.5'\necho 'low memory' >&2\ntouch \"$7\"",
        );

        let mut console = Vec::new();
        let report = invoker(prog)
            .run(&step(tmp.path()), &mut console)
            .await
            .unwrap();

        let console = String::from_utf8(console).unwrap();
        assert_eq!(
            console,
            "\n  > warping\n  > cost 0.5\n  > \n\n\n  > low memory\n\n"
        );
        assert!(!report.terminated);
        assert_eq!(report.stderr_bytes, "low memory\n".len());
        assert!(tmp.path().join("EXP 4 b (aligned).exr").exists());
    }

    #[tokio::test]
    #[serial]
    async fn test_stderr_alone_does_not_fail() {
        let tmp = TempDir::new().unwrap();
        let prog = script(tmp.path(), "echo 'error: something odd' >&2\nexit 0");

        let mut console = Vec::new();
        let report = invoker(prog).run(&step(tmp.path()), &mut console).await;
        assert!(report.is_ok());
        assert!(
            String::from_utf8(console)
                .unwrap()
                .contains("  > error: something odd")
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_nonzero_exit_fails() {
        let tmp = TempDir::new().unwrap();
        let prog = script(tmp.path(), "echo 'bad input' >&2\nexit 2");

        let mut console = Vec::new();
        match invoker(prog).run(&step(tmp.path()), &mut console).await {
            Err(AlignError::AlignerFailed { code }) => assert_eq!(code, 2),
            other => panic!("expected AlignerFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_program_is_spawn_error() {
        let tmp = TempDir::new().unwrap();
        let mut console = Vec::new();
        let result = invoker(tmp.path().join("nope"))
            .run(&step(tmp.path()), &mut console)
            .await;
        assert!(matches!(result, Err(AlignError::SpawnError { .. })));
    }

    #[tokio::test]
    #[serial]
    async fn test_stubborn_child_times_out() {
        let tmp = TempDir::new().unwrap();
        // Closes its output, then ignores SIGTERM
        let prog = script(tmp.path(), "trap '' TERM\nexec >&- 2>&-\nexec sleep 30");

        let mut console = Vec::new();
        let started = Instant::now();
        let result = invoker(prog)
            .with_exit_timeout(Duration::from_secs(1))
            .run(&step(tmp.path()), &mut console)
            .await;

        match result {
            Err(AlignError::ExitTimeout { output, timeout }) => {
                assert_eq!(output, tmp.path().join("EXP 4 b (aligned).exr"));
                assert_eq!(timeout, Duration::from_secs(1));
            }
            other => panic!("expected ExitTimeout, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[serial]
    async fn test_subsecond_timeout_is_reported_exactly() {
        let tmp = TempDir::new().unwrap();
        let prog = script(tmp.path(), "trap '' TERM\nexec >&- 2>&-\nexec sleep 30");

        let mut console = Vec::new();
        let err = invoker(prog)
            .with_exit_timeout(Duration::from_millis(500))
            .run(&step(tmp.path()), &mut console)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AlignError::ExitTimeout { timeout, .. } if timeout == Duration::from_millis(500)
        ));
        assert!(err.to_string().contains("within 500ms"));
    }

    #[tokio::test]
    #[serial]
    async fn test_death_by_signal_is_reported() {
        let tmp = TempDir::new().unwrap();
        let prog = script(tmp.path(), "read go\necho 'warping'\nkill -9 $$");

        let mut console = Vec::new();
        let err = invoker(prog)
            .run(&step(tmp.path()), &mut console)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Aligner was killed by signal 9");
        match err {
            AlignError::AlignerKilled { signal } => assert_eq!(signal, libc::SIGKILL),
            other => panic!("expected AlignerKilled, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_error_mapping() {
        // Raw wait statuses: exit code in the high byte, signal in the low bits
        let exited = ExitStatus::from_raw(3 << 8);
        assert!(matches!(exit_error(exited), AlignError::AlignerFailed { code: 3 }));

        let segv = ExitStatus::from_raw(libc::SIGSEGV);
        assert!(matches!(
            exit_error(segv),
            AlignError::AlignerKilled { signal } if signal == libc::SIGSEGV
        ));
    }
}
