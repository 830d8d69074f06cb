use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::scenario::{CheckerStore, Task};
use crate::session::{ingest_log, CheckError, IngestedSession};
use crate::verdict::{verification_code, Verdict};

/// Per-check switches. Verbosity itself is left to the `tracing` filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Log the final satisfaction matrix at info level.
    pub dump_matrix: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub task: String,
    pub salt: i32,
    pub verdict: Verdict,
    pub condition_count: usize,
    pub verification_code: String,
}

/// Checks the session log at `log_path` against the task `task_name`.
pub fn check_log(
    store: &CheckerStore,
    task_name: &str,
    salt: i32,
    log_path: &Path,
    options: &CheckOptions,
) -> Result<CheckOutcome, CheckError> {
    if log_path.as_os_str().is_empty() {
        return Err(CheckError::EmptyLogPath);
    }
    let task = find_task(store, task_name)?;
    let raw = fs::read_to_string(log_path).map_err(|source| {
        warn!(log = %log_path.display(), error = %source, "log_unreadable");
        CheckError::ReadLog {
            path: log_path.to_path_buf(),
            source,
        }
    })?;
    debug!(task = task_name, log = %log_path.display(), "check_started");
    run_check(store.secret(), task, salt, &raw, options)
}

/// Same as [`check_log`] for a log already held in memory.
pub fn check_log_text(
    store: &CheckerStore,
    task_name: &str,
    salt: i32,
    raw: &str,
    options: &CheckOptions,
) -> Result<CheckOutcome, CheckError> {
    let task = find_task(store, task_name)?;
    run_check(store.secret(), task, salt, raw, options)
}

fn find_task<'a>(store: &'a CheckerStore, task_name: &str) -> Result<&'a Task, CheckError> {
    if task_name.is_empty() {
        return Err(CheckError::EmptyTaskName);
    }
    store.task(task_name).ok_or_else(|| {
        warn!(task = task_name, "unknown_task");
        CheckError::UnknownTask {
            name: task_name.to_string(),
        }
    })
}

fn run_check(
    secret: &str,
    task: &Task,
    salt: i32,
    raw: &str,
    options: &CheckOptions,
) -> Result<CheckOutcome, CheckError> {
    let session = ingest_log(task, raw).map_err(|error| {
        warn!(task = %task.name, error = %error, "log_rejected");
        error
    })?;
    if options.dump_matrix {
        log_matrix(task, &session);
    }

    let verdict = Verdict::from_matrix(&session.matrix);
    let code = verification_code(secret, &task.name, salt, verdict);
    info!(
        task = %task.name,
        salt,
        verdict = verdict.bits(),
        events = session.event_count,
        objects = session.objects.len(),
        "check_completed"
    );
    Ok(CheckOutcome {
        task: task.name.clone(),
        salt,
        verdict,
        condition_count: task.conditions.len(),
        verification_code: code,
    })
}

fn log_matrix(task: &Task, session: &IngestedSession) {
    info!(
        task = %task.name,
        matrix = %format!("\n{}", session.matrix.render_human_readable(&session.objects)),
        "satisfaction_matrix"
    );
}
