use tracing::debug;

use crate::scenario::{Condition, ConditionKind, Selector};
use crate::session::SceneObject;

use super::matrix::SatisfactionMatrix;

/// Event-specific data handed to the evaluator alongside the object set.
///
/// Indices point into the scene object slice. Position updates carry no
/// payload at all.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventPayload {
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
    pub argument: f32,
    pub won: bool,
}

impl EventPayload {
    pub fn actor(primary: usize, argument: f32) -> Self {
        Self {
            primary: Some(primary),
            argument,
            ..Self::default()
        }
    }

    pub fn pair(primary: usize, secondary: usize, argument: f32) -> Self {
        Self {
            primary: Some(primary),
            secondary: Some(secondary),
            argument,
            won: false,
        }
    }

    pub fn won() -> Self {
        Self {
            won: true,
            ..Self::default()
        }
    }
}

fn selects(selector: Option<&Selector>, object: &SceneObject) -> bool {
    selector.is_some_and(|selector| selector.matches(object.kind, object.class.as_deref()))
}

/// Scans ordered pairs of distinct objects for one that matches both
/// selectors and satisfies `accept`. Leaves the scanned primary in
/// `primary_index`.
fn scan_pairs(
    condition: &Condition,
    objects: &[SceneObject],
    primary_index: &mut usize,
    accept: impl Fn(&SceneObject, &SceneObject) -> bool,
) -> bool {
    for (i, primary) in objects.iter().enumerate() {
        *primary_index = i;
        if !selects(condition.primary.as_ref(), primary) {
            continue;
        }
        let found = objects.iter().enumerate().any(|(j, secondary)| {
            i != j && selects(condition.secondary.as_ref(), secondary) && accept(primary, secondary)
        });
        if found {
            return true;
        }
    }
    false
}

/// Evaluates one condition against the current object state and event.
///
/// An AND-partner is only evaluated once the condition itself holds, and it
/// is re-tested without the event payload. Partners whose kind needs an
/// explicit actor (`attack`, `damage`, `destroy`) therefore never hold.
pub fn test_condition(
    time: i64,
    condition: &Condition,
    objects: &[SceneObject],
    payload: EventPayload,
    primary_index: &mut usize,
) -> bool {
    let supplied = |index: Option<usize>| index.and_then(|index| objects.get(index));

    let found = match condition.kind {
        ConditionKind::ObjectProximity => {
            scan_pairs(condition, objects, primary_index, |primary, secondary| {
                primary.position.distance(secondary.position) <= condition.argument
            })
        }
        ConditionKind::ObjectApproaching => {
            scan_pairs(condition, objects, primary_index, |primary, secondary| {
                primary.position.distance(secondary.position)
                    < primary
                        .previous_position
                        .distance(secondary.previous_position)
            })
        }
        ConditionKind::ObjectRetiring => {
            scan_pairs(condition, objects, primary_index, |primary, secondary| {
                primary.position.distance(secondary.position)
                    > primary
                        .previous_position
                        .distance(secondary.previous_position)
            })
        }
        ConditionKind::ObjectMoving => objects.iter().enumerate().any(|(i, object)| {
            *primary_index = i;
            selects(condition.primary.as_ref(), object)
                && object.position.distance(object.previous_position) > 0.0
        }),
        ConditionKind::Attacked => {
            match (supplied(payload.primary), supplied(payload.secondary)) {
                (Some(attacker), Some(target)) => {
                    selects(condition.primary.as_ref(), attacker)
                        && selects(condition.secondary.as_ref(), target)
                        && condition.argument >= payload.argument
                }
                _ => false,
            }
        }
        ConditionKind::Damaged => supplied(payload.primary).is_some_and(|object| {
            selects(condition.primary.as_ref(), object) && condition.argument >= payload.argument
        }),
        ConditionKind::Destroyed => supplied(payload.primary)
            .is_some_and(|object| selects(condition.primary.as_ref(), object)),
        ConditionKind::GameWon => payload.won,
    };

    if !found {
        return false;
    }
    debug!(
        time,
        condition = condition.id,
        kind = condition.kind.config_token(),
        object = *primary_index,
        "condition_satisfied"
    );
    match &condition.partner {
        Some(partner) => test_condition(
            time,
            partner,
            objects,
            EventPayload::default(),
            primary_index,
        ),
        None => true,
    }
}

/// Evaluates every condition of a task against one event and records the
/// satisfied ones into `matrix`.
///
/// The recording slot is shared by the whole pass: a scanning condition
/// leaves it on the object it stopped at, and later actor conditions record
/// there.
pub fn test_all_conditions(
    time: i64,
    conditions: &[Condition],
    objects: &[SceneObject],
    matrix: &mut SatisfactionMatrix,
    payload: EventPayload,
) {
    let mut primary_index = payload.primary.unwrap_or(0);
    for (row, condition) in conditions.iter().enumerate() {
        if !test_condition(time, condition, objects, payload, &mut primary_index) {
            continue;
        }
        if condition.kind == ConditionKind::GameWon {
            matrix.record_all(row);
        } else {
            matrix.record(row, primary_index);
        }
    }
}
