use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Frame acquisition failures. Contained per region by the evaluator.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture command '{command}' could not be started: {source}")]
    Unavailable {
        command: String,
        source: std::io::Error,
    },

    #[error("Capture command '{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Capture command '{command}' returned no data")]
    Empty { command: String },

    #[error("Captured frame could not be decoded: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    #[error("Captured frame {width}x{height} does not contain area {area_width}x{area_height} at ({left},{top})")]
    OutsideFrame {
        width: u32,
        height: u32,
        left: i32,
        top: i32,
        area_width: u32,
        area_height: u32,
    },
}

/// Template image problems. Never cached: the next lookup retries the load.
#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("Template '{name}' is not defined in the configuration")]
    Unknown { name: String },

    #[error("Template image for '{name}' not found: {path:?}")]
    Missing { name: String, path: PathBuf },

    #[error("Failed to decode template '{name}' from {path:?}: {source}")]
    Decode {
        name: String,
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Template '{name}' at {path:?} has no pixels")]
    Empty { name: String, path: PathBuf },
}

/// A click could not be performed. Fatal to the current loop run.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("Click command '{command}' could not be started: {source}")]
    Unavailable {
        command: String,
        source: std::io::Error,
    },

    #[error("Click command '{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Click at ({x},{y}) rejected: {reason}")]
    Rejected { x: i32, y: i32, reason: String },
}

/// Failure while evaluating a single trade region.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Template(#[from] TemplateLoadError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }
}

/// Errors surfaced to whoever owns the automation engine.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateLoadError),

    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

pub type AutomationResult<T> = Result<T, AutomationError>;
