use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Library error code for bad call parameters and unreadable inputs.
pub const BAD_PARAMETERS_CODE: i32 = 1;
/// Library error code for malformed log text.
pub const FORMAT_ERROR_CODE: i32 = 2;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("task name must not be empty")]
    EmptyTaskName,
    #[error("log path must not be empty")]
    EmptyLogPath,
    #[error("cannot find task with name {name}")]
    UnknownTask { name: String },
    #[error("cannot open log file {path}: {source}")]
    ReadLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bad log line {line}: {message}")]
    Format { line: usize, message: String },
    #[error("unknown object '{reference}' referenced on log line {line}")]
    UnknownObject { line: usize, reference: String },
    #[error("wrong number of scene objects {parsed} instead of {expected}")]
    SceneRowCount { expected: usize, parsed: usize },
    #[error("log ended while {stage}; no complete scene object table found")]
    MissingSceneTable { stage: &'static str },
    #[error("log does not contain correct base object type {kind} class '{class}'")]
    UnmatchedBaseObject { kind: &'static str, class: String },
    #[error(
        "log contains {found} objects of type {kind} class '{class}', expected between {minimum} and {limit}"
    )]
    RequirementOutOfRange {
        kind: &'static str,
        class: String,
        found: u32,
        minimum: u32,
        limit: u32,
    },
}

impl CheckError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    pub fn library_code(&self) -> i32 {
        match self {
            Self::EmptyTaskName
            | Self::EmptyLogPath
            | Self::UnknownTask { .. }
            | Self::ReadLog { .. } => BAD_PARAMETERS_CODE,
            _ => FORMAT_ERROR_CODE,
        }
    }
}
