use crate::geometry::Point;
use crate::text::{leading_f32, leading_i64, parse_coordinates};

use super::error::CheckError;

const TIME_START: char = '[';
const TIME_FINISH: char = ']';
const POSITION_MARKER: &str = "position:";
const POSITION_ENTRY_DELIMITER: char = ';';
const TOKEN_DELIMITER: char = ' ';
const ATTACK_PREFIX: &str = "attack ";
const ATTACKED_PREFIX: &str = "attacked ";
const DIED_MARKER: &str = "died";
const GAME_OVER_PREFIX: &str = "Game Over: ";
const WIN_TOKEN: &str = "Win";
const SESSION_ENDED_PREFIX: &str = "Session ended";

/// Tokens before the target in `attack <attacker> t1 <damage> t3 t4 <target>`.
const ATTACK_LEADING_TOKENS: usize = 5;
/// Tokens read from `attacked <target>, t1 t2 <damage> ...`.
const ATTACKED_TOKENS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PositionEntry {
    pub reference: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EventKind {
    PositionUpdate(Vec<PositionEntry>),
    Attack {
        attacker: String,
        damage: f32,
        target: String,
    },
    Attacked {
        target: String,
        damage: f32,
    },
    Died {
        subject: String,
    },
    GameOver {
        won: bool,
    },
    SessionEnded,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogEvent {
    pub time: i64,
    pub kind: EventKind,
}

/// Parses one event-stream line. Lines without a leading timestamp are not
/// events and yield `None`.
pub(crate) fn parse_event_line(line: &str, line_no: usize) -> Result<Option<LogEvent>, CheckError> {
    let Some(stamped) = line.strip_prefix(TIME_START) else {
        return Ok(None);
    };
    let Some((time_text, body)) = stamped.split_once(TIME_FINISH) else {
        return Err(CheckError::format(
            line_no,
            format!("bad log string '{line}' (no time section)"),
        ));
    };
    let time = leading_i64(time_text).unwrap_or(0);
    let body = body.trim_start_matches([' ', '\t']);

    let kind = if body.contains(POSITION_MARKER) {
        EventKind::PositionUpdate(parse_position_entries(body, line_no)?)
    } else if let Some(rest) = body.strip_prefix(ATTACK_PREFIX) {
        parse_attack(rest, line_no)?
    } else if let Some(rest) = body.strip_prefix(ATTACKED_PREFIX) {
        parse_attacked(rest, line_no)?
    } else if body.contains(DIED_MARKER) {
        let Some((subject, _)) = body.split_once(TOKEN_DELIMITER) else {
            return Err(CheckError::format(line_no, format!("bad died string '{body}'")));
        };
        EventKind::Died {
            subject: subject.to_string(),
        }
    } else if let Some(rest) = body.strip_prefix(GAME_OVER_PREFIX) {
        EventKind::GameOver {
            won: rest.trim_end() == WIN_TOKEN,
        }
    } else if body.starts_with(SESSION_ENDED_PREFIX) {
        EventKind::SessionEnded
    } else {
        return Err(CheckError::format(
            line_no,
            format!("unrecognized event '{body}' at time {time}"),
        ));
    };

    Ok(Some(LogEvent { time, kind }))
}

fn parse_position_entries(body: &str, line_no: usize) -> Result<Vec<PositionEntry>, CheckError> {
    let mut entries = Vec::new();
    for raw_entry in body.split(POSITION_ENTRY_DELIMITER) {
        let entry = raw_entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((reference, remainder)) = entry.split_once(TOKEN_DELIMITER) else {
            return Err(CheckError::format(
                line_no,
                format!("bad position string '{entry}'"),
            ));
        };
        // Object entries carry "position:" before the pair; the player's does not.
        let coordinates = match remainder.find(POSITION_MARKER) {
            Some(idx) => &remainder[idx + POSITION_MARKER.len()..],
            None => remainder,
        };
        let position = parse_coordinates(coordinates).ok_or_else(|| {
            CheckError::format(
                line_no,
                format!("bad coordinates '{}' in position string", coordinates.trim()),
            )
        })?;
        entries.push(PositionEntry {
            reference: reference.to_string(),
            position,
        });
    }
    Ok(entries)
}

fn parse_attack(rest: &str, line_no: usize) -> Result<EventKind, CheckError> {
    let tokens = rest
        .splitn(ATTACK_LEADING_TOKENS + 1, TOKEN_DELIMITER)
        .collect::<Vec<_>>();
    if tokens.len() <= ATTACK_LEADING_TOKENS {
        return Err(CheckError::format(
            line_no,
            format!("bad attack string 'attack {rest}'"),
        ));
    }
    Ok(EventKind::Attack {
        attacker: tokens[0].to_string(),
        damage: leading_f32(tokens[2]).unwrap_or(0.0),
        target: tokens[ATTACK_LEADING_TOKENS].trim().to_string(),
    })
}

fn parse_attacked(rest: &str, line_no: usize) -> Result<EventKind, CheckError> {
    let tokens = rest
        .splitn(ATTACKED_TOKENS + 1, TOKEN_DELIMITER)
        .map(|token| token.trim_end_matches(','))
        .collect::<Vec<_>>();
    if tokens.len() <= ATTACKED_TOKENS {
        return Err(CheckError::format(
            line_no,
            format!("bad attacked string 'attacked {rest}'"),
        ));
    }
    Ok(EventKind::Attacked {
        target: tokens[0].to_string(),
        damage: leading_f32(tokens[3]).unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> EventKind {
        parse_event_line(line, 1)
            .expect("parse")
            .expect("event")
            .kind
    }

    #[test]
    fn lines_without_timestamp_are_skipped() {
        assert_eq!(parse_event_line("Some banner text", 1).expect("parse"), None);
        assert_eq!(parse_event_line("", 1).expect("parse"), None);
    }

    #[test]
    fn missing_time_terminator_is_an_error() {
        assert!(matches!(
            parse_event_line("[12 Player (1,1)", 9),
            Err(CheckError::Format { line: 9, .. })
        ));
    }

    #[test]
    fn position_update_lists_every_entry() {
        let event = parse_event_line(
            "[125] 12 position: (1.00, 2.00); Player (3.5, 4.5); 13 wolf position: (0,0);",
            1,
        )
        .expect("parse")
        .expect("event");
        assert_eq!(event.time, 125);
        assert_eq!(
            event.kind,
            EventKind::PositionUpdate(vec![
                PositionEntry {
                    reference: "12".to_string(),
                    position: Point::new(1.0, 2.0),
                },
                PositionEntry {
                    reference: "Player".to_string(),
                    position: Point::new(3.5, 4.5),
                },
                PositionEntry {
                    reference: "13".to_string(),
                    position: Point::new(0.0, 0.0),
                },
            ])
        );
    }

    #[test]
    fn malformed_position_entries_fail() {
        assert!(parse_event_line("[1] 12position:(1,2)", 1).is_err());
        assert!(parse_event_line("[1] 12 position: (1 2)", 1).is_err());
    }

    #[test]
    fn attack_reads_attacker_damage_and_target() {
        assert_eq!(
            parse("[40] attack Player with 15 damage to 12"),
            EventKind::Attack {
                attacker: "Player".to_string(),
                damage: 15.0,
                target: "12".to_string(),
            }
        );
        assert!(parse_event_line("[40] attack Player with 15", 1).is_err());
    }

    #[test]
    fn attacked_reads_target_and_damage() {
        assert_eq!(
            parse("[41] attacked Player, received damage 7 from 12"),
            EventKind::Attacked {
                target: "Player".to_string(),
                damage: 7.0,
            }
        );
        assert!(parse_event_line("[41] attacked Player, 7", 1).is_err());
    }

    #[test]
    fn died_uses_first_token_as_subject() {
        assert_eq!(
            parse("[50] 12 died"),
            EventKind::Died {
                subject: "12".to_string(),
            }
        );
    }

    #[test]
    fn game_over_only_wins_on_exact_marker() {
        assert_eq!(parse("[60] Game Over: Win"), EventKind::GameOver { won: true });
        assert_eq!(parse("[60] Game Over: Lose"), EventKind::GameOver { won: false });
        assert_eq!(parse("[60] Game Over: Winner"), EventKind::GameOver { won: false });
    }

    #[test]
    fn session_end_and_unknown_lines() {
        assert_eq!(parse("[70] Session ended"), EventKind::SessionEnded);
        assert!(matches!(
            parse_event_line("[71] Something odd", 5),
            Err(CheckError::Format { line: 5, .. })
        ));
    }
}
