//! Drives a whole bracket directory through the aligner, one step at a time.

use crate::aligner::AlignerInvoker;
use crate::collect::collect_brackets;
use crate::error::{AlignError, Result};
use crate::plan::{ChainPlan, plan_chain};
use crate::process::find_aligner;
use crate::types::{PlanStep, display_name};
use bracket_config::BracketConfig;
use bracket_config::types::DEFAULT_ALIGNER_BIN;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// How a run ended without error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The directory holds no bracket images.
    NoCandidates,
    /// Only one bracket image was found.
    NotEnoughImages { found: usize },
    /// Every step ran.
    Completed { steps: usize, elapsed: Duration },
}

/// Collect and plan the brackets in `dir` without running anything.
pub fn plan_directory(dir: &Path, config: &BracketConfig) -> Result<ChainPlan> {
    let records = collect_brackets(dir, &config.output.suffix)?;
    plan_chain(records, &config.output.suffix)
}

/// Align every bracket image in `dir`, writing the progress report to
/// `console`.
///
/// Steps run strictly in order since each one reads the previous step's
/// output. The first failing step stops the run.
pub async fn align_directory<W: Write>(
    dir: &Path,
    config: &BracketConfig,
    console: &mut W,
) -> Result<RunOutcome> {
    let started = Instant::now();

    let plan = plan_directory(dir, config)?;
    write_listing(&plan, console)?;
    if let Some(outcome) = insufficient(&plan, console)? {
        return Ok(outcome);
    }

    let program = find_aligner(config.aligner.path.as_deref()).await?;
    info!("Using aligner {}", program.display());
    let invoker = AlignerInvoker::new(program, &config.aligner, &config.tuning);

    for step in &plan.steps {
        run_step(&invoker, step, console).await?;
    }

    let elapsed = started.elapsed();
    write!(
        console,
        "\nall images done in {:.2} s\n\n",
        elapsed.as_secs_f64()
    )?;
    console.flush()?;

    Ok(RunOutcome::Completed {
        steps: plan.steps.len(),
        elapsed,
    })
}

/// Print what [`align_directory`] would do, including each aligner command
/// line, without spawning the aligner.
pub fn preview_directory<W: Write>(
    dir: &Path,
    config: &BracketConfig,
    console: &mut W,
) -> Result<RunOutcome> {
    let plan = plan_directory(dir, config)?;
    write_listing(&plan, console)?;
    if let Some(outcome) = insufficient(&plan, console)? {
        return Ok(outcome);
    }

    let program = config
        .aligner
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ALIGNER_BIN));
    let invoker = AlignerInvoker::new(program, &config.aligner, &config.tuning);

    for step in &plan.steps {
        writeln!(
            console,
            "step {}: \"{}\" -> \"{}\" (x{})",
            step.index,
            step.base.display_name(),
            display_name(&step.target_path),
            step.multiplier
        )?;
        writeln!(console, "  output: {}", step.output_path.display())?;
        let command = std::iter::once(invoker.program().as_os_str().to_os_string())
            .chain(invoker.args_for(step))
            .map(|arg| quote_arg(&arg.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(console, "  command: {command}")?;
    }
    console.flush()?;

    Ok(RunOutcome::Completed {
        steps: plan.steps.len(),
        elapsed: Duration::ZERO,
    })
}

/// Print the brightest-first listing.
pub fn write_listing<W: Write>(plan: &ChainPlan, console: &mut W) -> std::io::Result<()> {
    writeln!(
        console,
        "found {} exposure-bracketed images",
        plan.ordered.len()
    )?;
    for record in &plan.ordered {
        writeln!(
            console,
            "- {} ({:.8} sec.)",
            record.display_name(),
            record.exposure_secs()
        )?;
    }
    writeln!(console)?;
    console.flush()
}

fn insufficient<W: Write>(plan: &ChainPlan, console: &mut W) -> Result<Option<RunOutcome>> {
    if plan.is_runnable() {
        return Ok(None);
    }

    writeln!(console, "need at least 2 images")?;
    console.flush()?;
    let outcome = match plan.ordered.len() {
        0 => RunOutcome::NoCandidates,
        found => RunOutcome::NotEnoughImages { found },
    };
    Ok(Some(outcome))
}

async fn run_step<W: Write>(
    invoker: &AlignerInvoker,
    step: &PlanStep,
    console: &mut W,
) -> Result<()> {
    let base_name = step.base.display_name();
    writeln!(
        console,
        "aligning \"{}\" to \"{}\"",
        base_name,
        display_name(&step.target_path)
    )?;
    console.flush()?;

    let report = invoker
        .run(step, console)
        .await
        .map_err(|e| AlignError::StepFailed {
            step: step.index,
            base: base_name.clone(),
            source: Box::new(e),
        })?;

    writeln!(
        console,
        "\"{}\" done in {:.2} s\n",
        base_name,
        report.elapsed.as_secs_f64()
    )?;
    console.flush()?;
    Ok(())
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
