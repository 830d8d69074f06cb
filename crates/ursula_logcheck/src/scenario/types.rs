use std::fmt;

use crate::geometry::Point;

/// A verdict carries one bit per condition, so a task holds at most this many.
pub const MAX_CONDITIONS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Player,
    Mob,
    InteractiveObject,
    Static,
}

impl ObjectKind {
    pub fn from_config_token(token: &str) -> Option<Self> {
        match token {
            "player" => Some(Self::Player),
            "mob" => Some(Self::Mob),
            "intobj" => Some(Self::InteractiveObject),
            "static" => Some(Self::Static),
            _ => None,
        }
    }

    pub fn config_token(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Mob => "mob",
            Self::InteractiveObject => "intobj",
            Self::Static => "static",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    ObjectProximity,
    ObjectApproaching,
    ObjectRetiring,
    ObjectMoving,
    GameWon,
    Attacked,
    Damaged,
    Destroyed,
}

impl ConditionKind {
    pub fn from_config_token(token: &str) -> Option<Self> {
        match token {
            "proxy" => Some(Self::ObjectProximity),
            "approach" => Some(Self::ObjectApproaching),
            "retire" => Some(Self::ObjectRetiring),
            "move" => Some(Self::ObjectMoving),
            "win" => Some(Self::GameWon),
            "attack" => Some(Self::Attacked),
            "damage" => Some(Self::Damaged),
            "destroy" => Some(Self::Destroyed),
            _ => None,
        }
    }

    pub fn config_token(self) -> &'static str {
        match self {
            Self::ObjectProximity => "proxy",
            Self::ObjectApproaching => "approach",
            Self::ObjectRetiring => "retire",
            Self::ObjectMoving => "move",
            Self::GameWon => "win",
            Self::Attacked => "attack",
            Self::Damaged => "damage",
            Self::Destroyed => "destroy",
        }
    }
}

/// Object selector used by conditions: a kind plus a class name.
///
/// The Player never carries a class, so it satisfies any class constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub kind: ObjectKind,
    pub class: String,
}

impl Selector {
    pub fn matches(&self, kind: ObjectKind, class: Option<&str>) -> bool {
        if self.kind != kind {
            return false;
        }
        kind == ObjectKind::Player || class == Some(self.class.as_str())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.kind.config_token(), self.class)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseObjectSpec {
    pub kind: ObjectKind,
    /// Empty means any class.
    pub class: String,
    /// `None` means the position is irrelevant.
    pub position: Option<Point>,
    /// Zero is a wildcard.
    pub hp: f32,
    /// Zero is a wildcard.
    pub damage: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRequirement {
    pub kind: ObjectKind,
    pub class: String,
    pub minimum: u32,
    pub limit: u32,
}

impl ObjectRequirement {
    pub fn accepts_count(&self, found: u32) -> bool {
        (self.minimum..=self.limit).contains(&found)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub id: u32,
    pub kind: ConditionKind,
    pub primary: Option<Selector>,
    pub secondary: Option<Selector>,
    pub argument: f32,
    /// AND-partner declared on the line right after this one with the same id.
    pub partner: Option<Box<Condition>>,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let primary = display_selector(self.primary.as_ref());
        let secondary = display_selector(self.secondary.as_ref());
        write!(f, "{}. ", self.id)?;
        match self.kind {
            ConditionKind::ObjectProximity => write!(
                f,
                "obj.proximity: {primary}-[{:.2}]-{secondary}",
                self.argument
            ),
            ConditionKind::ObjectApproaching => {
                write!(f, "obj.approaching: {primary}->{secondary}")
            }
            ConditionKind::ObjectRetiring => write!(f, "obj.retiring: {primary}->{secondary}"),
            ConditionKind::ObjectMoving => write!(f, "obj.moving: {primary}"),
            ConditionKind::GameWon => write!(f, "game won"),
            ConditionKind::Attacked => write!(
                f,
                "obj.attacked: {primary}-{{{:.2}}}->{secondary}",
                self.argument
            ),
            ConditionKind::Damaged => {
                write!(f, "obj.damaged: -{{{:.2}}}->{primary}", self.argument)
            }
            ConditionKind::Destroyed => write!(f, "obj.destroyed: {primary}"),
        }
    }
}

fn display_selector(selector: Option<&Selector>) -> String {
    selector.map_or_else(|| "(-)".to_string(), ToString::to_string)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    pub base_objects: Vec<BaseObjectSpec>,
    pub requirements: Vec<ObjectRequirement>,
    pub conditions: Vec<Condition>,
}

impl Task {
    pub fn render_human_readable(&self) -> String {
        let mut output = format!("task={}", self.name);
        if !self.base_objects.is_empty() {
            output.push_str("\n  base objects:");
            for (idx, spec) in self.base_objects.iter().enumerate() {
                let position = spec
                    .position
                    .map(|p| format!("({:.2}, {:.2})", p.x, p.y))
                    .unwrap_or_else(|| "n/d".to_string());
                output.push_str(&format!(
                    "\n    {}. type: {}, class: {}, pos: {}, hp: {:.2}, dmg: {:.2}",
                    idx + 1,
                    spec.kind.config_token(),
                    spec.class,
                    position,
                    spec.hp,
                    spec.damage
                ));
            }
        }
        if !self.requirements.is_empty() {
            output.push_str("\n  object requirements:");
            for req in &self.requirements {
                output.push_str(&format!(
                    "\n    type: {}, class: {}, minimum: {}, limit: {}",
                    req.kind.config_token(),
                    req.class,
                    req.minimum,
                    req.limit
                ));
            }
        }
        output.push_str("\n  conditions:");
        for condition in &self.conditions {
            output.push_str(&format!("\n    {condition}"));
            if let Some(partner) = &condition.partner {
                output.push_str(&format!("\n    AND:\n      {partner}"));
            }
        }
        output
    }
}
