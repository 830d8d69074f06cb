use std::fmt;
use std::path::PathBuf;

use crate::session::BAD_PARAMETERS_CODE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    ReadFile,
    MissingDelimiter,
    UnknownObjectType,
    UnknownConditionType,
    InvalidValue,
    ConditionCount,
    CountMismatch,
    ChainTooLong,
    DuplicateSecret,
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub code: ConfigErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub line: Option<usize>,
}

impl ConfigError {
    pub(crate) fn new(code: ConfigErrorCode, message: String, file_path: PathBuf) -> Self {
        Self {
            code,
            message,
            file_path,
            line: None,
        }
    }

    pub(crate) fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Config failures surface as bad parameters.
    pub fn library_code(&self) -> i32 {
        BAD_PARAMETERS_CODE
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{:?}: {} (file={}, line={})",
                self.code,
                self.message,
                self.file_path.display(),
                line
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
