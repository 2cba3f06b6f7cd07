//! Classification reports and their aggregation.
//!
//! This module provides:
//! - [`trajectory::TrajReport`] -- the immutable per-trajectory record:
//!   verdict counts plus the ordered candidate frame indices.
//! - [`exploration::ExplorationReport`] -- the single aggregation point for a
//!   selection run: records trajectory reports, derives global totals, and
//!   draws the bounded, seeded candidate selection.

pub mod exploration;
pub mod trajectory;

// Re-export the most commonly used items at the module level.
pub use exploration::{ExplorationReport, FrameRef, ReportTotals};
pub use trajectory::{FrameCounts, TrajReport};
