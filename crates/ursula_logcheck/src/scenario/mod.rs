mod error;
mod store;
mod task_parser;
mod types;

pub use error::{ConfigError, ConfigErrorCode};
pub use store::CheckerStore;
pub use task_parser::load_task_config;
pub use types::{
    BaseObjectSpec, Condition, ConditionKind, ObjectKind, ObjectRequirement, Selector, Task,
    MAX_CONDITIONS,
};
