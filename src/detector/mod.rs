pub mod activity;
pub mod dedup;
pub mod evaluator;
pub mod levels;
pub mod moneyness;

pub use evaluator::{CycleEvaluator, EvaluatorConfig};
