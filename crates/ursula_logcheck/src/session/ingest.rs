use tracing::debug;

use crate::evaluation::{test_all_conditions, EventPayload, SatisfactionMatrix};
use crate::geometry::Point;
use crate::scenario::Task;
use crate::text::parse_trailing_coordinates;

use super::error::CheckError;
use super::events::{parse_event_line, EventKind};
use super::scene::{parse_scene_row, validate_scene, SceneObject, SceneValidation};

const PLAYER_START_MARKER: &str = "Player Start Position";
const SCENE_HEADER: &str = "ID | Name | Object ID | Type | Position | HP | Damage";
const SCENE_TABLE_END: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IngestState {
    AwaitPlayerStart,
    AwaitSceneHeader,
    ReadingSceneTable,
    ReadingEventStream,
}

impl IngestState {
    fn stage(self) -> &'static str {
        match self {
            Self::AwaitPlayerStart => "waiting for the player start position",
            Self::AwaitSceneHeader => "waiting for the scene object header",
            Self::ReadingSceneTable => "reading the scene object table",
            Self::ReadingEventStream => "reading the event stream",
        }
    }
}

/// Everything one log produced for one task.
#[derive(Debug, Clone)]
pub struct IngestedSession {
    pub objects: Vec<SceneObject>,
    pub matrix: SatisfactionMatrix,
    pub validation: SceneValidation,
    pub event_count: usize,
}

struct EventStream<'a> {
    task: &'a Task,
    objects: Vec<SceneObject>,
    matrix: SatisfactionMatrix,
    validation: SceneValidation,
    event_count: usize,
}

impl EventStream<'_> {
    /// Index of the object named by `reference`. Position updates take the
    /// first object answering to it, actor events take the last.
    fn resolve(&self, reference: &str, last: bool, line_no: usize) -> Result<usize, CheckError> {
        let mut candidates = self.objects.iter();
        let answers = |object: &SceneObject| object.answers_to(reference);
        let found = if last {
            candidates.rposition(answers)
        } else {
            candidates.position(answers)
        };
        found.ok_or_else(|| CheckError::UnknownObject {
                line: line_no,
                reference: reference.to_string(),
            })
    }

    fn evaluate(&mut self, time: i64, payload: EventPayload) {
        test_all_conditions(
            time,
            &self.task.conditions,
            &self.objects,
            &mut self.matrix,
            payload,
        );
    }

    /// Applies one event line. Returns `false` once the session has ended.
    fn apply(&mut self, line: &str, line_no: usize) -> Result<bool, CheckError> {
        let Some(event) = parse_event_line(line, line_no)? else {
            return Ok(true);
        };
        self.event_count += 1;
        match event.kind {
            EventKind::PositionUpdate(entries) => {
                for entry in entries {
                    let index = self.resolve(&entry.reference, false, line_no)?;
                    self.objects[index].move_to(entry.position);
                }
                self.evaluate(event.time, EventPayload::default());
            }
            EventKind::Attack {
                attacker,
                damage,
                target,
            } => {
                let attacker = self.resolve(&attacker, true, line_no)?;
                let target = self.resolve(&target, true, line_no)?;
                self.evaluate(event.time, EventPayload::pair(attacker, target, damage));
            }
            EventKind::Attacked { target, damage } => {
                let target = self.resolve(&target, true, line_no)?;
                self.evaluate(event.time, EventPayload::actor(target, damage));
            }
            EventKind::Died { subject } => {
                let subject = self.resolve(&subject, true, line_no)?;
                self.evaluate(event.time, EventPayload::actor(subject, 0.0));
            }
            EventKind::GameOver { won: true } => {
                self.evaluate(event.time, EventPayload::won());
            }
            EventKind::GameOver { won: false } => {
                debug!(time = event.time, "game_over_without_win");
            }
            EventKind::SessionEnded => {
                debug!(time = event.time, "session_ended");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn finish(self) -> IngestedSession {
        IngestedSession {
            objects: self.objects,
            matrix: self.matrix,
            validation: self.validation,
            event_count: self.event_count,
        }
    }
}

/// Reads one session log against `task`: player start, scene table, then
/// the event stream until `Session ended` or end of input.
pub(crate) fn ingest_log(task: &Task, raw: &str) -> Result<IngestedSession, CheckError> {
    let lines = raw.lines().collect::<Vec<_>>();
    let mut state = IngestState::AwaitPlayerStart;
    let mut player_start = Point::default();
    let mut stream: Option<EventStream<'_>> = None;
    let mut idx = 0usize;

    while idx < lines.len() {
        let line = lines[idx];
        let line_no = idx + 1;
        idx += 1;

        match state {
            IngestState::AwaitPlayerStart => {
                if let Some(rest) = line.strip_prefix(PLAYER_START_MARKER) {
                    player_start = parse_trailing_coordinates(rest).ok_or_else(|| {
                        CheckError::format(
                            line_no,
                            format!("bad player start coordinates '{}'", rest.trim()),
                        )
                    })?;
                    state = IngestState::AwaitSceneHeader;
                }
            }
            IngestState::AwaitSceneHeader => {
                if line.starts_with(SCENE_HEADER) {
                    state = IngestState::ReadingSceneTable;
                }
            }
            IngestState::ReadingSceneTable => {
                let first_row = idx - 1;
                let objects = read_scene_table(&lines, first_row, player_start)?;
                let validation = validate_scene(task, &objects)?;
                debug!(
                    task = %task.name,
                    object_count = objects.len(),
                    "scene_table_loaded"
                );
                // Table rows plus the player slot put us just past the terminator.
                idx = first_row + objects.len();
                stream = Some(EventStream {
                    task,
                    matrix: SatisfactionMatrix::new(task.conditions.len(), objects.len()),
                    objects,
                    validation,
                    event_count: 0,
                });
                state = IngestState::ReadingEventStream;
            }
            IngestState::ReadingEventStream => {
                let Some(events) = stream.as_mut() else {
                    return Err(CheckError::MissingSceneTable {
                        stage: state.stage(),
                    });
                };
                if !events.apply(line, line_no)? {
                    break;
                }
            }
        }
    }

    match stream {
        Some(events) if state == IngestState::ReadingEventStream => Ok(events.finish()),
        _ => Err(CheckError::MissingSceneTable {
            stage: state.stage(),
        }),
    }
}

/// Counts the rows up to the table terminator, then parses them. The player
/// object is appended last.
fn read_scene_table(
    lines: &[&str],
    first_row: usize,
    player_start: Point,
) -> Result<Vec<SceneObject>, CheckError> {
    let expected = lines[first_row..]
        .iter()
        .position(|line| line.starts_with(SCENE_TABLE_END))
        .ok_or(CheckError::MissingSceneTable {
            stage: IngestState::ReadingSceneTable.stage(),
        })?;

    let mut objects = Vec::with_capacity(expected + 1);
    for (offset, row) in lines[first_row..first_row + expected].iter().enumerate() {
        if row.trim().is_empty() {
            continue;
        }
        objects.push(parse_scene_row(row, first_row + offset + 1)?);
    }
    if objects.len() != expected {
        return Err(CheckError::SceneRowCount {
            expected,
            parsed: objects.len(),
        });
    }
    objects.push(SceneObject::player(player_start));
    Ok(objects)
}
