//! Scheduling artifacts derived from stored projects and tasks.
//!
//! # Responsibility
//! - Build dependency graphs and compute critical paths.
//! - Compute burndown series, deadline alerts and statistics.
//!
//! # Invariants
//! - Everything here is pure: inputs are owned model values, no I/O.

pub mod burndown;
pub mod critical_path;
pub mod deadlines;
pub mod graph;
pub mod stats;
