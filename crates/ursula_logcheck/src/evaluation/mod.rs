mod engine;
mod matrix;

pub use engine::{test_all_conditions, test_condition, EventPayload};
pub use matrix::SatisfactionMatrix;
