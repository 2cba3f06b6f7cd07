//! Dataset assembly: turning selected frame references into a persisted
//! configuration set.
//!
//! The assembler is a pure consumer of the selection -- it never mutates
//! report state. Selected pairs are grouped by trajectory; each contributing
//! trajectory is loaded once, its chosen frames extracted in ascending
//! order, run through the filter chain, and merged into a species-grouped
//! [`MultiFrames`] that is persisted at the end. Trajectories with no
//! selected frames are skipped entirely.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::conf::{Frames, MultiFrames};
use crate::devi::ModelDevi;
use crate::error::{Result, SiftError};
use crate::report::FrameRef;

use super::filter::ConfFilters;
use super::selector::TrajSource;

/// Assembles the output dataset from selected frame references.
pub struct DatasetAssembler<'a> {
    filters: &'a ConfFilters,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(filters: &'a ConfFilters) -> Self {
        Self { filters }
    }

    /// Extract `picked` from `sources` and persist the merged dataset under
    /// `out_dir` (created if absent, reused if present).
    ///
    /// Returns the output directory path.
    pub fn assemble(
        &self,
        picked: &[FrameRef],
        sources: &[TrajSource],
        type_map: &[String],
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for fr in picked {
            groups.entry(fr.traj).or_default().push(fr.frame);
        }

        let mut dataset = MultiFrames::new(type_map.to_vec());
        for (traj, mut frame_ids) in groups {
            frame_ids.sort_unstable();
            let src = sources.get(traj).ok_or_else(|| {
                SiftError::InvalidArgument(format!(
                    "selected pair references trajectory {traj}, but only {} sources were given",
                    sources.len()
                ))
            })?;

            let frames = Frames::load(&src.conf, src.fmt, type_map)?;
            // Safety net: the classification pass already checked this, but
            // the assembler may be handed stale paths.
            let devi = ModelDevi::load(&src.devi)?;
            if frames.nframes() != devi.nframes() {
                return Err(SiftError::ShapeMismatch {
                    path: src.conf.clone(),
                    conf_frames: frames.nframes(),
                    devi_frames: devi.nframes(),
                });
            }

            let mut sub = frames.sub_frames(&frame_ids)?;
            let dropped = self.filters.apply(&mut sub);
            tracing::info!(
                traj,
                selected = frame_ids.len(),
                dropped,
                "extracted candidate frames"
            );
            dataset.append(sub)?;
        }

        dataset.to_deepmd_raw(out_dir)?;
        tracing::info!(
            path = %out_dir.display(),
            systems = dataset.formulas().len(),
            nframes = dataset.nframes_total(),
            "persisted selected configurations"
        );
        Ok(out_dir.to_path_buf())
    }
}
