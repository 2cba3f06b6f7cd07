//! Trust-level frame classification.
//!
//! Each uncertainty metric partitions a trajectory's frames into three
//! disjoint sets against its threshold band:
//!
//! ```text
//! v < lo          accurate    trusted, no labeling needed
//! lo <= v < hi    candidate   borderline, worth labeling
//! v >= hi         failed      beyond usable range
//! ```
//!
//! Boundaries are inclusive toward the higher-uncertainty bucket: a value
//! equal to `lo` is never accurate, a value equal to `hi` is never a
//! candidate. When both metrics are evaluated the most pessimistic verdict
//! wins (failed > candidate > accurate), so a frame is never trusted more
//! than its least-trusted signal.

use crate::config::TrustLevel;
use crate::devi::ModelDevi;

/// Per-frame verdict. Ordered by increasing pessimism, so combining two
/// metrics is a plain `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Accurate,
    Candidate,
    Failed,
}

/// Classify a single metric value against a threshold band.
pub fn band_verdict(v: f64, lo: f64, hi: f64) -> Verdict {
    if v < lo {
        Verdict::Accurate
    } else if v < hi {
        Verdict::Candidate
    } else {
        Verdict::Failed
    }
}

/// Classify every value of one metric vector.
pub fn band_verdicts(values: &[f64], lo: f64, hi: f64) -> Vec<Verdict> {
    values.iter().map(|&v| band_verdict(v, lo, hi)).collect()
}

/// Three disjoint, ascending index sets whose union is `0..nframes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameClasses {
    pub accurate: Vec<usize>,
    pub candidate: Vec<usize>,
    pub failed: Vec<usize>,
}

impl FrameClasses {
    /// Partition frame indices by their final verdicts.
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let mut classes = Self::default();
        for (i, v) in verdicts.iter().enumerate() {
            match v {
                Verdict::Accurate => classes.accurate.push(i),
                Verdict::Candidate => classes.candidate.push(i),
                Verdict::Failed => classes.failed.push(i),
            }
        }
        classes
    }

    /// Total number of classified frames.
    pub fn nframes(&self) -> usize {
        self.accurate.len() + self.candidate.len() + self.failed.len()
    }
}

/// Classify one trajectory's frames against a trust level.
///
/// The force metric is always evaluated; the virial metric joins in only
/// when the trust level carries a virial band, and the per-frame result is
/// the most pessimistic of the two. Zero frames yield three empty sets.
pub fn classify(devi: &ModelDevi, trust: &TrustLevel) -> FrameClasses {
    let mut verdicts = band_verdicts(&devi.force_max, trust.force_lo, trust.force_hi);
    if let (Some(lo), Some(hi)) = (trust.virial_lo, trust.virial_hi) {
        debug_assert_eq!(devi.force_max.len(), devi.virial_max.len());
        for (v, &virial) in verdicts.iter_mut().zip(&devi.virial_max) {
            *v = (*v).max(band_verdict(virial, lo, hi));
        }
    }
    FrameClasses::from_verdicts(&verdicts)
}
