//! Checks recorded Ursula game-session logs against scenario tasks and
//! produces a tamper-evident verdict.

pub mod checker;
pub mod evaluation;
pub mod geometry;
pub mod scenario;
pub mod session;
mod text;
pub mod verdict;

pub use checker::{check_log, check_log_text, CheckOptions, CheckOutcome};
pub use evaluation::{test_all_conditions, test_condition, EventPayload, SatisfactionMatrix};
pub use geometry::{Point, POSITION_EPSILON};
pub use scenario::{
    load_task_config, BaseObjectSpec, CheckerStore, Condition, ConditionKind, ConfigError,
    ConfigErrorCode, ObjectKind, ObjectRequirement, Selector, Task, MAX_CONDITIONS,
};
pub use session::{
    CheckError, SceneObject, SceneValidation, BAD_PARAMETERS_CODE, FORMAT_ERROR_CODE,
};
pub use verdict::{verification_code, Verdict};
