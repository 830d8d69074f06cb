use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::text::{leading_f32, leading_i64, parse_coordinates};

use super::error::{ConfigError, ConfigErrorCode};
use super::types::{
    BaseObjectSpec, Condition, ConditionKind, ObjectKind, ObjectRequirement, Selector, Task,
    MAX_CONDITIONS,
};

const FIELD_DELIMITER: char = ':';
const FIELDS_PER_RECORD: usize = 7;
const HEADER_ID_PREFIX: &str = "id";
const HEADER_OBJ_PREFIX: &str = "obj";
const BASE_OBJECT_TAG: &str = "base";
const REQUIREMENT_TAG: &str = "req";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RecordCounts {
    base_objects: usize,
    requirements: usize,
    conditions: usize,
}

pub fn load_task_config(name: &str, path: &Path) -> Result<Task, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| {
        ConfigError::new(
            ConfigErrorCode::ReadFile,
            format!("cannot read task config for '{name}': {source}"),
            path.to_path_buf(),
        )
    })?;
    parse_task_config(name, path, &raw)
}

pub(crate) fn parse_task_config(name: &str, path: &Path, raw: &str) -> Result<Task, ConfigError> {
    let predicted = count_records(raw);
    if predicted.conditions == 0 {
        return Err(ConfigError::new(
            ConfigErrorCode::ConditionCount,
            "no conditions described".to_string(),
            path.to_path_buf(),
        ));
    }
    if predicted.conditions > MAX_CONDITIONS {
        return Err(ConfigError::new(
            ConfigErrorCode::ConditionCount,
            format!(
                "too many conditions ({}); at most {MAX_CONDITIONS} are supported",
                predicted.conditions
            ),
            path.to_path_buf(),
        ));
    }

    let mut task = Task {
        name: name.to_string(),
        base_objects: Vec::with_capacity(predicted.base_objects),
        requirements: Vec::with_capacity(predicted.requirements),
        conditions: Vec::with_capacity(predicted.conditions),
    };

    for (idx, line) in record_lines(raw) {
        let line_no = idx + 1;
        let fields = line.splitn(FIELDS_PER_RECORD, FIELD_DELIMITER).collect::<Vec<_>>();
        if fields.len() < FIELDS_PER_RECORD {
            return Err(ConfigError::new(
                ConfigErrorCode::MissingDelimiter,
                format!(
                    "bad record '{line}': expected {FIELDS_PER_RECORD} '{FIELD_DELIMITER}'-separated fields"
                ),
                path.to_path_buf(),
            )
            .at_line(line_no));
        }

        let parsed = match fields[0] {
            BASE_OBJECT_TAG => parse_base_object(&fields).map(|spec| task.base_objects.push(spec)),
            REQUIREMENT_TAG => parse_requirement(&fields).map(|req| task.requirements.push(req)),
            _ => parse_condition(&fields).and_then(|condition| {
                attach_condition(&mut task.conditions, condition)
            }),
        };
        parsed.map_err(|(code, message)| {
            ConfigError::new(code, message, path.to_path_buf()).at_line(line_no)
        })?;
    }

    let recovered = RecordCounts {
        base_objects: task.base_objects.len(),
        requirements: task.requirements.len(),
        conditions: task.conditions.len(),
    };
    if recovered != predicted {
        return Err(ConfigError::new(
            ConfigErrorCode::CountMismatch,
            format!(
                "cannot read all records: conditions {}/{}, object requirements {}/{}, base objects {}/{}",
                recovered.conditions,
                predicted.conditions,
                recovered.requirements,
                predicted.requirements,
                recovered.base_objects,
                predicted.base_objects
            ),
            path.to_path_buf(),
        ));
    }

    debug!(
        task = %task.name,
        base_objects = task.base_objects.len(),
        requirements = task.requirements.len(),
        conditions = task.conditions.len(),
        "task_config_parsed"
    );
    Ok(task)
}

/// Non-header, non-blank lines with their zero-based line index.
fn record_lines(raw: &str) -> impl Iterator<Item = (usize, &str)> {
    raw.lines()
        .map(|line| line.trim_end_matches('\r'))
        .enumerate()
        .filter(|(_, line)| !is_skipped_line(line))
}

fn is_skipped_line(line: &str) -> bool {
    line.is_empty()
        || line.starts_with(HEADER_ID_PREFIX)
        || line.starts_with(HEADER_OBJ_PREFIX)
        || line.starts_with([' ', '\t'])
}

fn count_records(raw: &str) -> RecordCounts {
    let mut counts = RecordCounts::default();
    let mut last_id = 0i64;
    for (_, line) in record_lines(raw) {
        if line.starts_with(BASE_OBJECT_TAG) {
            counts.base_objects += 1;
        } else if line.starts_with(REQUIREMENT_TAG) {
            counts.requirements += 1;
        } else {
            let id = leading_i64(line).unwrap_or(0);
            if id > last_id {
                last_id = id;
                counts.conditions += 1;
            }
        }
    }
    counts
}

type RecordError = (ConfigErrorCode, String);

fn parse_object_kind(token: &str) -> Result<ObjectKind, RecordError> {
    ObjectKind::from_config_token(token).ok_or_else(|| {
        (
            ConfigErrorCode::UnknownObjectType,
            format!("bad object type '{token}'; allowed values: player, mob, intobj, static"),
        )
    })
}

fn parse_positive(token: &str, field_name: &str) -> Result<u32, RecordError> {
    leading_i64(token)
        .filter(|value| *value > 0)
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| {
            (
                ConfigErrorCode::InvalidValue,
                format!("bad {field_name} '{token}'; must be a positive integer"),
            )
        })
}

fn parse_selector(kind_token: &str, class_token: &str) -> Result<Option<Selector>, RecordError> {
    if kind_token.is_empty() {
        return Ok(None);
    }
    Ok(Some(Selector {
        kind: parse_object_kind(kind_token)?,
        class: class_token.to_string(),
    }))
}

fn parse_base_object(fields: &[&str]) -> Result<BaseObjectSpec, RecordError> {
    let kind = parse_object_kind(fields[1].trim())?;
    let position_token = fields[3].trim();
    let position = if position_token.is_empty() {
        None
    } else {
        Some(parse_coordinates(position_token).ok_or_else(|| {
            (
                ConfigErrorCode::InvalidValue,
                format!("bad coordinates '{position_token}'"),
            )
        })?)
    };
    Ok(BaseObjectSpec {
        kind,
        class: fields[2].trim().to_string(),
        position,
        hp: leading_f32(fields[4]).unwrap_or(0.0),
        damage: leading_f32(fields[5]).unwrap_or(0.0),
    })
}

fn parse_requirement(fields: &[&str]) -> Result<ObjectRequirement, RecordError> {
    let kind = parse_object_kind(fields[1].trim())?;
    let class = fields[2].trim().to_string();
    let minimum = parse_positive(fields[3], "minimum number")?;
    let limit = parse_positive(fields[4], "limit number")?;
    if !fields[5].trim().is_empty() {
        return Err((
            ConfigErrorCode::InvalidValue,
            format!("bad object requirement tail '{}'; expected an empty field", fields[5]),
        ));
    }
    if limit < minimum {
        warn!(
            class = %class,
            minimum,
            limit,
            "object_requirement_never_satisfiable"
        );
    }
    Ok(ObjectRequirement {
        kind,
        class,
        minimum,
        limit,
    })
}

fn parse_condition(fields: &[&str]) -> Result<Condition, RecordError> {
    let id = parse_positive(fields[0], "condition number")?;
    let kind_token = fields[1].trim();
    let kind = ConditionKind::from_config_token(kind_token).ok_or_else(|| {
        (
            ConfigErrorCode::UnknownConditionType,
            format!(
                "bad condition type '{kind_token}'; allowed values: proxy, approach, retire, move, win, attack, damage, destroy"
            ),
        )
    })?;
    Ok(Condition {
        id,
        kind,
        primary: parse_selector(fields[2].trim(), fields[3].trim())?,
        secondary: parse_selector(fields[4].trim(), fields[5].trim())?,
        argument: leading_f32(fields[6]).unwrap_or(0.0),
        partner: None,
    })
}

fn attach_condition(conditions: &mut Vec<Condition>, condition: Condition) -> Result<(), RecordError> {
    match conditions.last_mut() {
        Some(previous) if previous.id == condition.id => {
            if previous.partner.is_some() {
                return Err((
                    ConfigErrorCode::ChainTooLong,
                    format!(
                        "condition {} already has an AND partner; at most two records may share an id",
                        condition.id
                    ),
                ));
            }
            previous.partner = Some(Box::new(condition));
        }
        _ => conditions.push(condition),
    }
    Ok(())
}
