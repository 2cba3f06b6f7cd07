//! The selection pipeline: classification, filtering, orchestration and
//! dataset assembly.
//!
//! This module provides:
//! - [`classify`] -- pure trust-level banding of per-frame uncertainty
//!   metrics and the pessimistic dual-metric combination.
//! - [`filter`] -- the optional post-classification filter chain applied to
//!   extracted frames before persistence.
//! - [`selector::FrameSelector`] -- the orchestrator that classifies every
//!   trajectory, aggregates reports, draws the bounded selection and hands
//!   it to the assembler.
//! - [`assemble::DatasetAssembler`] -- extraction and species-grouped
//!   persistence of the selected frames.

pub mod assemble;
pub mod classify;
pub mod filter;
pub mod selector;

// Re-export the most commonly used items at the module level.
pub use assemble::DatasetAssembler;
pub use classify::{classify, FrameClasses, Verdict};
pub use filter::{ConfFilter, ConfFilters, MinDistanceFilter};
pub use selector::{FrameSelector, TrajSource};
