//! Framesift: trust-level frame selection from molecular-dynamics trajectories.
//!
//! The decision core of an active-learning materials loop: classify every
//! frame of every trajectory against uncertainty thresholds, aggregate the
//! per-trajectory reports, select a bounded set of borderline ("candidate")
//! frames, and assemble exactly those frames into a persisted dataset for
//! downstream labeling.

pub mod conf;
pub mod config;
pub mod devi;
pub mod error;
pub mod report;
pub mod select;
