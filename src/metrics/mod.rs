//! Per-signal dispatch statistics.

pub mod engine;
pub mod stats;

pub use engine::DispatchMetrics;
