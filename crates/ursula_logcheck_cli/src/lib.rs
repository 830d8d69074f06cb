use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use ursula_logcheck::{check_log, verification_code, CheckOptions, CheckOutcome, CheckerStore};

pub const CONFIG_ENV_VAR: &str = "URSULA_CHECK_CONFIG";
pub const USAGE_EXIT_CODE: u8 = 99;
const SUITE_FAILURE_EXIT_CODE: u8 = 1;
const OUTPUT_FAILURE_EXIT_CODE: u8 = 1;
const SUITE_DELIMITER: char = ':';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub json: bool,
    pub dump_matrix: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Check {
        config_path: PathBuf,
        task: String,
        salt: i32,
        log_path: PathBuf,
    },
    Suite {
        config_path: PathBuf,
        suite_path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Help,
    Run {
        options: OutputOptions,
        kind: CommandKind,
    },
}

/// Error message plus the process exit code it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliFailure {
    pub exit_code: u8,
    pub message: String,
}

impl CliFailure {
    fn new(exit_code: i32, message: String) -> Self {
        Self {
            exit_code: u8::try_from(exit_code).unwrap_or(OUTPUT_FAILURE_EXIT_CODE),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteCase {
    pub task: String,
    pub expected: u8,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct FailedCheck<'a> {
    task: &'a str,
    error: String,
    library_code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct SuiteResult {
    task: String,
    log: String,
    salt: i32,
    expected: u8,
    observed: u8,
    code_verified: bool,
    passed: bool,
}

pub fn usage_text() -> String {
    [
        "ursula-logcheck - Ursula game log checker",
        "",
        "Usage:",
        "  ursula-logcheck [--json] [--dump-matrix] <config-file> <task-id> <salt> <log-file>",
        "  ursula-logcheck [--json] [--dump-matrix] <task-id> <salt> <log-file>",
        "  ursula-logcheck [--json] --suite <tests-file> [<config-file>]",
        "",
        "Environment:",
        "  URSULA_CHECK_CONFIG  config file used when <config-file> is omitted",
        "  RUST_LOG             log filter (default: warn)",
    ]
    .join("\n")
}

/// Parses command-line arguments (without the program name).
pub fn parse_args(args: &[String], env_config: Option<&str>) -> Result<CliCommand, String> {
    let mut options = OutputOptions::default();
    let mut suite_path: Option<PathBuf> = None;
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--json" => {
                options.json = true;
                index += 1;
            }
            "--dump-matrix" => {
                options.dump_matrix = true;
                index += 1;
            }
            "--suite" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --suite".to_string())?;
                suite_path = Some(PathBuf::from(value));
                index += 2;
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            _ => break,
        }
    }
    let positional = &args[index..];

    let config_from = |explicit: Option<&String>| -> Result<PathBuf, String> {
        explicit
            .map(PathBuf::from)
            .or_else(|| env_config.filter(|path| !path.is_empty()).map(PathBuf::from))
            .ok_or_else(|| format!("missing <config-file> (pass it or set {CONFIG_ENV_VAR})"))
    };

    let kind = match (suite_path, positional.len()) {
        (Some(suite_path), 0 | 1) => CommandKind::Suite {
            config_path: config_from(positional.first())?,
            suite_path,
        },
        (Some(_), count) => {
            return Err(format!("--suite takes at most one positional argument, got {count}"))
        }
        (None, 3) => check_command(config_from(None)?, &positional[0..3])?,
        (None, 4) => check_command(PathBuf::from(&positional[0]), &positional[1..4])?,
        (None, count) => return Err(format!("expected 3 or 4 arguments, got {count}")),
    };
    Ok(CliCommand::Run { options, kind })
}

fn check_command(config_path: PathBuf, args: &[String]) -> Result<CommandKind, String> {
    let salt = args[1]
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("invalid <salt> value '{}' (expected i32)", args[1]))?;
    Ok(CommandKind::Check {
        config_path,
        task: args[0].clone(),
        salt,
        log_path: PathBuf::from(&args[2]),
    })
}

pub fn run<W: Write>(
    options: &OutputOptions,
    kind: &CommandKind,
    stdout: &mut W,
) -> Result<(), CliFailure> {
    let check_options = CheckOptions {
        dump_matrix: options.dump_matrix,
    };
    match kind {
        CommandKind::Check {
            config_path,
            task,
            salt,
            log_path,
        } => {
            let store = load_store(config_path)?;
            match check_log(&store, task, *salt, log_path, &check_options) {
                Ok(outcome) => write_outcome(stdout, &outcome, options.json),
                Err(err) => {
                    let report = FailedCheck {
                        task,
                        error: err.to_string(),
                        library_code: err.library_code(),
                    };
                    write_failed_check(stdout, &report, options.json)?;
                    Err(CliFailure::new(
                        err.library_code(),
                        format!("Program checking error: {err}"),
                    ))
                }
            }
        }
        CommandKind::Suite {
            config_path,
            suite_path,
        } => {
            let store = load_store(config_path)?;
            run_suite(&store, suite_path, &check_options, options.json, stdout)
        }
    }
}

fn load_store(config_path: &Path) -> Result<CheckerStore, CliFailure> {
    CheckerStore::init(config_path).map_err(|err| {
        CliFailure::new(
            err.library_code(),
            format!("Cannot initialize Ursula log checker: {err}"),
        )
    })
}

fn write_outcome<W: Write>(
    stdout: &mut W,
    outcome: &CheckOutcome,
    json: bool,
) -> Result<(), CliFailure> {
    let text = if json {
        to_json(outcome)?
    } else {
        format!(
            "Checking completed!\nResult code: {}\nCode string: {}",
            outcome.verdict, outcome.verification_code
        )
    };
    write_text(stdout, &text)
}

fn write_failed_check<W: Write>(
    stdout: &mut W,
    report: &FailedCheck<'_>,
    json: bool,
) -> Result<(), CliFailure> {
    let text = if json {
        to_json(report)?
    } else {
        "Result code: 0".to_string()
    };
    write_text(stdout, &text)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliFailure> {
    serde_json::to_string(value).map_err(|err| {
        CliFailure::new(
            i32::from(OUTPUT_FAILURE_EXIT_CODE),
            format!("failed to encode json output: {err}"),
        )
    })
}

fn write_text<W: Write>(stdout: &mut W, text: &str) -> Result<(), CliFailure> {
    writeln!(stdout, "{text}").map_err(|err| {
        CliFailure::new(
            i32::from(OUTPUT_FAILURE_EXIT_CODE),
            format!("failed to write output: {err}"),
        )
    })
}

/// Parses `task:expected verdict:log path` lines. Lines with another field
/// count are skipped; relative log paths resolve against `base_dir`.
pub fn parse_suite(raw: &str, base_dir: &Path) -> Result<Vec<SuiteCase>, String> {
    let mut cases = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let fields = line.split(SUITE_DELIMITER).collect::<Vec<_>>();
        let [task, expected, log] = fields.as_slice() else {
            continue;
        };
        let expected = expected.trim().parse::<u8>().map_err(|_| {
            format!(
                "invalid expected result '{}' on suite line {}",
                expected.trim(),
                idx + 1
            )
        })?;
        let log_path = PathBuf::from(log.trim());
        let log_path = if log_path.is_absolute() {
            log_path
        } else {
            base_dir.join(log_path)
        };
        cases.push(SuiteCase {
            task: task.to_string(),
            expected,
            log_path,
        });
    }
    Ok(cases)
}

fn run_suite<W: Write>(
    store: &CheckerStore,
    suite_path: &Path,
    check_options: &CheckOptions,
    json: bool,
    stdout: &mut W,
) -> Result<(), CliFailure> {
    let raw = fs::read_to_string(suite_path).map_err(|err| {
        CliFailure::new(
            i32::from(SUITE_FAILURE_EXIT_CODE),
            format!("cannot read suite file {}: {err}", suite_path.display()),
        )
    })?;
    let base_dir = suite_path.parent().unwrap_or_else(|| Path::new(""));
    let cases = parse_suite(&raw, base_dir)
        .map_err(|message| CliFailure::new(i32::from(SUITE_FAILURE_EXIT_CODE), message))?;

    if !json {
        write_text(stdout, &format!("Testing (total {}):", cases.len()))?;
    }
    let mut results = Vec::with_capacity(cases.len());
    for (idx, case) in cases.iter().enumerate() {
        let salt = i32::try_from(idx + 1).unwrap_or(i32::MAX);
        // A failed check reports verdict 0, so expected-zero cases accept failures.
        let (observed, code_verified) =
            match check_log(store, &case.task, salt, &case.log_path, check_options) {
                Ok(outcome) => (
                    outcome.verdict.bits(),
                    outcome.verification_code
                        == verification_code(store.secret(), &case.task, salt, outcome.verdict),
                ),
                Err(err) => {
                    warn!(task = %case.task, log = %case.log_path.display(), error = %err, "suite_check_failed");
                    (0, true)
                }
            };
        let result = SuiteResult {
            task: case.task.clone(),
            log: case.log_path.display().to_string(),
            salt,
            expected: case.expected,
            observed,
            code_verified,
            passed: observed == case.expected && code_verified,
        };
        if !json {
            let status = if result.passed {
                "OK".to_string()
            } else if !code_verified {
                "wrong code string".to_string()
            } else {
                format!("wrong result {observed} (expected {})", case.expected)
            };
            write_text(
                stdout,
                &format!(
                    "Running checker {} {} with salt {salt}... {status}",
                    result.task, result.log
                ),
            )?;
        }
        results.push(result);
    }

    let failed = results.iter().filter(|result| !result.passed).count();
    if json {
        write_text(stdout, &to_json(&results)?)?;
    } else if failed == 0 {
        write_text(stdout, "Done!")?;
    }
    info!(total = results.len(), failed, "suite_completed");
    if failed > 0 {
        return Err(CliFailure::new(
            i32::from(SUITE_FAILURE_EXIT_CODE),
            format!("{failed} of {} suite cases failed", results.len()),
        ));
    }
    Ok(())
}
