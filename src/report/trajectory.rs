//! Per-trajectory classification record.

use serde::{Deserialize, Serialize};

use crate::select::classify::FrameClasses;

/// Frame counts per verdict for one trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounts {
    pub accurate: usize,
    pub candidate: usize,
    pub failed: usize,
}

impl FrameCounts {
    /// Total number of classified frames.
    pub fn total(&self) -> usize {
        self.accurate + self.candidate + self.failed
    }
}

/// The classification outcome of a single trajectory: verdict counts plus
/// the ordered list of candidate frame indices.
///
/// Built once from a classifier result and immutable afterwards; the
/// aggregator takes ownership when it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajReport {
    traj_index: usize,
    counts: FrameCounts,
    /// Candidate frame indices, ascending. Downstream extraction relies on
    /// this ordering.
    candidates: Vec<usize>,
}

impl TrajReport {
    /// Build a report from a trajectory's classifier output.
    pub fn from_classes(traj_index: usize, classes: &FrameClasses) -> Self {
        Self {
            traj_index,
            counts: FrameCounts {
                accurate: classes.accurate.len(),
                candidate: classes.candidate.len(),
                failed: classes.failed.len(),
            },
            candidates: classes.candidate.clone(),
        }
    }

    /// Index of the trajectory this report describes.
    pub fn traj_index(&self) -> usize {
        self.traj_index
    }

    /// Verdict counts.
    pub fn counts(&self) -> FrameCounts {
        self.counts
    }

    /// Candidate frame indices, ascending.
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Number of frames classified in this trajectory.
    pub fn nframes(&self) -> usize {
        self.counts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_classes() {
        let classes = FrameClasses {
            accurate: vec![0, 3],
            candidate: vec![1, 4],
            failed: vec![2],
        };
        let report = TrajReport::from_classes(7, &classes);
        assert_eq!(report.traj_index(), 7);
        assert_eq!(report.nframes(), 5);
        assert_eq!(
            report.counts(),
            FrameCounts {
                accurate: 2,
                candidate: 2,
                failed: 1
            }
        );
        assert_eq!(report.candidates(), &[1, 4]);
    }

    #[test]
    fn test_empty_trajectory() {
        let report = TrajReport::from_classes(0, &FrameClasses::default());
        assert_eq!(report.nframes(), 0);
        assert!(report.candidates().is_empty());
    }
}
