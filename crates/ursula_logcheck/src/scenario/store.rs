use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigErrorCode};
use super::task_parser::load_task_config;
use super::types::Task;

const MANIFEST_DELIMITER: char = ':';
const SECRET_KEY: &str = "secret";

/// Shared secret plus every task declared by the checker manifest.
///
/// The store is immutable once built; each check works on its own copies of
/// runtime state, so one store can serve any number of checks.
#[derive(Debug, Clone)]
pub struct CheckerStore {
    secret: String,
    tasks: Vec<Task>,
}

impl CheckerStore {
    /// Loads the manifest at `config_path` and every task config it references.
    ///
    /// Manifest lines are `secret:<value>` or `<task name>:<task config path>`.
    /// Relative task paths resolve against the manifest's directory. A manifest
    /// without a secret hashes with an empty one.
    pub fn init(config_path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(config_path).map_err(|source| {
            ConfigError::new(
                ConfigErrorCode::ReadFile,
                format!("cannot open checker config: {source}"),
                config_path.to_path_buf(),
            )
        })?;
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut secret: Option<String> = None;
        let mut tasks = Vec::<Task>::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            let Some((key, value)) = line.split_once(MANIFEST_DELIMITER) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            if key == SECRET_KEY {
                if secret.is_some() {
                    warn!(line = idx + 1, "checker_secret_declared_twice");
                    return Err(ConfigError::new(
                        ConfigErrorCode::DuplicateSecret,
                        "trying to initialize the checker secret twice".to_string(),
                        config_path.to_path_buf(),
                    )
                    .at_line(idx + 1));
                }
                secret = Some(value.to_string());
                continue;
            }

            let task_path = resolve_task_path(&base_dir, value);
            let task = load_task_config(key, &task_path)?;
            debug!(description = %task.render_human_readable(), "task_config_loaded");
            tasks.push(task);
        }

        let secret = secret.unwrap_or_else(|| {
            warn!(config = %config_path.display(), "checker_secret_missing");
            String::new()
        });

        info!(
            config = %config_path.display(),
            task_count = tasks.len(),
            "checker_store_initialized"
        );
        Ok(Self { secret, tasks })
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// First task declared under `name`.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }
}

fn resolve_task_path(base_dir: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const TASK_A: &str = "1:proxy:player::mob:wolf:5\n";
    const TASK_B: &str = "1:win::::::\n2:move:player::::\n";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).expect("write");
        path
    }

    #[test]
    fn loads_secret_and_tasks_in_declaration_order() {
        let temp = TempDir::new().expect("tempdir");
        write_file(temp.path(), "a.cfg", TASK_A);
        write_file(temp.path(), "b.cfg", TASK_B);
        let manifest = write_file(
            temp.path(),
            "default.cfg",
            "secret:s3cr3t\ntask-a:a.cfg\n\nnot a record\ntask-b:b.cfg\nempty:\n",
        );

        let store = CheckerStore::init(&manifest).expect("init");
        assert_eq!(store.secret(), "s3cr3t");
        let names = store
            .tasks()
            .iter()
            .map(|task| task.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["task-a", "task-b"]);
        assert_eq!(store.task("task-b").expect("task").conditions.len(), 2);
        assert!(store.task("task-c").is_none());
    }

    #[test]
    fn absolute_task_paths_are_used_as_is() {
        let temp = TempDir::new().expect("tempdir");
        let nested = temp.path().join("tasks");
        fs::create_dir_all(&nested).expect("mkdir");
        let task_path = write_file(&nested, "a.cfg", TASK_A);
        let manifest = write_file(
            temp.path(),
            "default.cfg",
            &format!("secret:x\nabs:{}\n", task_path.display()),
        );
        let store = CheckerStore::init(&manifest).expect("init");
        assert!(store.task("abs").is_some());
    }

    #[test]
    fn lookup_takes_first_task_with_a_name() {
        let temp = TempDir::new().expect("tempdir");
        write_file(temp.path(), "a.cfg", TASK_A);
        write_file(temp.path(), "b.cfg", TASK_B);
        let manifest = write_file(
            temp.path(),
            "default.cfg",
            "secret:x\ndup:a.cfg\ndup:b.cfg\n",
        );
        let store = CheckerStore::init(&manifest).expect("init");
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.task("dup").expect("task").conditions.len(), 1);
    }

    #[test]
    fn duplicate_secret_is_fatal() {
        let temp = TempDir::new().expect("tempdir");
        let manifest = write_file(temp.path(), "default.cfg", "secret:a\nsecret:b\n");
        let err = CheckerStore::init(&manifest).expect_err("duplicate");
        assert_eq!(err.code, ConfigErrorCode::DuplicateSecret);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn missing_secret_falls_back_to_empty() {
        let temp = TempDir::new().expect("tempdir");
        write_file(temp.path(), "a.cfg", TASK_A);
        let manifest = write_file(temp.path(), "default.cfg", "task-a:a.cfg\nsecret:\n");
        let store = CheckerStore::init(&manifest).expect("init without secret");
        assert_eq!(store.secret(), "");
        assert!(store.task("task-a").is_some());
    }

    #[test]
    fn broken_task_config_fails_the_whole_store() {
        let temp = TempDir::new().expect("tempdir");
        write_file(temp.path(), "bad.cfg", "1:explode:player::mob:wolf:5\n");
        let manifest = write_file(temp.path(), "default.cfg", "secret:x\nbad:bad.cfg\n");
        let err = CheckerStore::init(&manifest).expect_err("bad task");
        assert_eq!(err.code, ConfigErrorCode::UnknownConditionType);
        assert!(err.file_path.ends_with("bad.cfg"));

        let manifest = write_file(temp.path(), "other.cfg", "secret:x\nmissing:nope.cfg\n");
        let err = CheckerStore::init(&manifest).expect_err("missing task");
        assert_eq!(err.code, ConfigErrorCode::ReadFile);
    }

    #[test]
    fn unreadable_manifest_reports_read_error() {
        let temp = TempDir::new().expect("tempdir");
        let err = CheckerStore::init(&temp.path().join("absent.cfg")).expect_err("absent");
        assert_eq!(err.code, ConfigErrorCode::ReadFile);
    }
}
