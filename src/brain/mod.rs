//! The Brain - Sizing, Profit Math, Evaluation
//!
//! `sizing` caps loan requests against vault depth, `profit` holds the
//! pure money equation, `evaluator` runs the checkpoint pipeline that
//! turns an opportunity into an execution signal or a logged skip.

pub mod evaluator;
pub mod profit;
pub mod sizing;
