//! Organ function and threshold notifications

pub mod function;
pub mod thresholds;

pub use function::{function_factor, recompute_all, recompute_organ_function, FunctionChange};
pub use thresholds::{thresholds_for, Crossing, ThresholdEvent};
