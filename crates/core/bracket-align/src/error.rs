use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlignError {
    #[error("Failed to read image directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Degenerate exposure in '{file_name}': numeral {numeral} gives no positive exposure")]
    DegenerateExposure { file_name: String, numeral: String },

    #[error("Aligner executable not found in PATH")]
    AlignerNotFound,

    #[error("Aligner executable not found at path: {path}")]
    AlignerNotFoundAtPath { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Failed to spawn process '{command}': {source}")]
    SpawnError {
        command: String,
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Aligner did not exit within {timeout:?}; output {} may be incomplete",
        output.display()
    )]
    ExitTimeout { output: PathBuf, timeout: Duration },

    #[error("Aligner exited with code {code}")]
    AlignerFailed { code: i32 },

    #[error("Aligner was killed by signal {signal}")]
    AlignerKilled { signal: i32 },

    #[error("Step {step} (aligning '{base}') failed: {source}")]
    StepFailed {
        step: usize,
        base: String,
        #[source]
        source: Box<AlignError>,
    },

    #[error("Process error: {message}")]
    ProcessError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AlignError>;
