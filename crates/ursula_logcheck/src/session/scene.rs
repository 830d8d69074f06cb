use tracing::{debug, warn};

use crate::geometry::Point;
use crate::scenario::{BaseObjectSpec, ObjectKind, ObjectRequirement, Task};
use crate::text::{leading_f32, parse_coordinates};

use super::error::CheckError;

pub(crate) const PLAYER_REFERENCE: &str = "Player";
const PLAYER_LABEL: &str = "PL";
const COLUMN_DELIMITER: char = '|';
const COLUMNS_PER_ROW: usize = 7;
const LOG_MOB: &str = "mob";
const LOG_INTERACTIVE_OBJECT: &str = "interactive_object";

/// A game entity as reported by the session log.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    /// Absent for the player.
    pub class: Option<String>,
    /// Log-assigned identifier; absent for the player.
    pub id: Option<String>,
    pub position: Point,
    pub previous_position: Point,
    pub hp: f32,
    pub damage: f32,
    pub position_known: bool,
}

impl SceneObject {
    pub fn player(start: Point) -> Self {
        Self {
            kind: ObjectKind::Player,
            class: None,
            id: None,
            position: start,
            previous_position: start,
            hp: 0.0,
            damage: 0.0,
            position_known: true,
        }
    }

    /// Short column label used in matrix dumps.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(PLAYER_LABEL)
    }

    pub fn class_name(&self) -> &str {
        self.class.as_deref().unwrap_or_default()
    }

    /// Whether an event reference (`Player` or a log id) designates this object.
    pub fn answers_to(&self, reference: &str) -> bool {
        match self.kind {
            ObjectKind::Player => reference == PLAYER_REFERENCE,
            _ => self.id.as_deref() == Some(reference),
        }
    }

    pub fn move_to(&mut self, position: Point) {
        self.previous_position = self.position;
        self.position = position;
        self.position_known = true;
    }

    fn satisfies_base_spec(&self, spec: &BaseObjectSpec) -> bool {
        let kind = spec.kind == self.kind;
        let class = spec.class.is_empty() || spec.class == self.class_name();
        let position = spec
            .position
            .map_or(true, |expected| self.position.approx_eq(expected));
        let hp = spec.hp == 0.0 || (spec.hp > 0.0 && spec.hp == self.hp);
        let damage = spec.damage == 0.0 || (spec.damage > 0.0 && spec.damage == self.damage);
        kind && class && position && hp && damage
    }

    fn counts_toward(&self, requirement: &ObjectRequirement) -> bool {
        requirement.kind == self.kind && requirement.class == self.class_name()
    }
}

pub(crate) fn kind_from_log_token(token: &str) -> ObjectKind {
    match token {
        LOG_MOB => ObjectKind::Mob,
        LOG_INTERACTIVE_OBJECT => ObjectKind::InteractiveObject,
        _ => ObjectKind::Static,
    }
}

/// Parses one `ID | Name | Object ID | Type | Position | HP | Damage` row.
pub(crate) fn parse_scene_row(line: &str, line_no: usize) -> Result<SceneObject, CheckError> {
    let columns = line
        .splitn(COLUMNS_PER_ROW, COLUMN_DELIMITER)
        .map(|column| column.trim_matches([' ', '\t']))
        .collect::<Vec<_>>();
    if columns.len() < COLUMNS_PER_ROW {
        return Err(CheckError::format(
            line_no,
            format!("bad scene object row '{line}': expected {COLUMNS_PER_ROW} columns"),
        ));
    }

    let id = columns[0];
    if id.is_empty() {
        return Err(CheckError::format(line_no, "empty scene object id"));
    }
    let class = columns[1];
    if class.is_empty() {
        return Err(CheckError::format(line_no, "empty scene object class"));
    }
    let position = parse_coordinates(columns[4]).ok_or_else(|| {
        CheckError::format(
            line_no,
            format!("bad scene object coordinates '{}'", columns[4]),
        )
    })?;

    Ok(SceneObject {
        kind: kind_from_log_token(columns[3]),
        class: Some(class.to_string()),
        id: Some(id.to_string()),
        position,
        previous_position: position,
        hp: leading_f32(columns[5]).unwrap_or(0.0),
        damage: leading_f32(columns[6]).unwrap_or(0.0),
        position_known: true,
    })
}

/// Per-check outcome of matching the scene table against the task setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneValidation {
    pub base_matched: Vec<bool>,
    pub requirement_counts: Vec<u32>,
}

pub(crate) fn validate_scene(
    task: &Task,
    objects: &[SceneObject],
) -> Result<SceneValidation, CheckError> {
    let mut validation = SceneValidation {
        base_matched: vec![false; task.base_objects.len()],
        requirement_counts: vec![0; task.requirements.len()],
    };

    for object in objects {
        for (matched, spec) in validation
            .base_matched
            .iter_mut()
            .zip(&task.base_objects)
        {
            if !*matched && object.satisfies_base_spec(spec) {
                *matched = true;
            }
        }
        for (found, requirement) in validation
            .requirement_counts
            .iter_mut()
            .zip(&task.requirements)
        {
            if object.counts_toward(requirement) {
                *found += 1;
            }
        }
    }

    if let Some(spec) = validation
        .base_matched
        .iter()
        .zip(&task.base_objects)
        .find_map(|(matched, spec)| (!matched).then_some(spec))
    {
        warn!(
            task = %task.name,
            kind = spec.kind.config_token(),
            class = %spec.class,
            "base_object_missing_from_log"
        );
        return Err(CheckError::UnmatchedBaseObject {
            kind: spec.kind.config_token(),
            class: spec.class.clone(),
        });
    }

    if let Some((found, requirement)) = validation
        .requirement_counts
        .iter()
        .zip(&task.requirements)
        .find(|(found, requirement)| !requirement.accepts_count(**found))
    {
        warn!(
            task = %task.name,
            kind = requirement.kind.config_token(),
            class = %requirement.class,
            found = *found,
            "object_requirement_out_of_range"
        );
        return Err(CheckError::RequirementOutOfRange {
            kind: requirement.kind.config_token(),
            class: requirement.class.clone(),
            found: *found,
            minimum: requirement.minimum,
            limit: requirement.limit,
        });
    }

    debug!(
        task = %task.name,
        object_count = objects.len(),
        "scene_validated"
    );
    Ok(validation)
}
