//! The frame-selection orchestrator.
//!
//! [`FrameSelector`] drives one selection run end to end:
//!
//! 1. For every trajectory: load its configurations and model deviations,
//!    validate that their frame counts agree, classify against the trust
//!    level, and record the resulting [`TrajReport`] into a fresh
//!    [`ExplorationReport`].
//! 2. Draw the bounded candidate selection from the populated report.
//! 3. Hand the selected pairs to the [`DatasetAssembler`], which persists
//!    the merged configuration set.
//!
//! Classification of distinct trajectories shares no mutable state; the
//! report's `record` call is the only aggregation point, so a caller may
//! fan the per-trajectory work out and feed this selector's building blocks
//! from worker tasks. This orchestrator itself runs them sequentially.

use std::path::{Path, PathBuf};

use crate::conf::{ConfFormat, Frames};
use crate::config::{SelectConfig, TrustLevel};
use crate::devi::ModelDevi;
use crate::error::{Result, SiftError};
use crate::report::{ExplorationReport, TrajReport};

use super::assemble::DatasetAssembler;
use super::classify::classify;
use super::filter::ConfFilters;

/// One trajectory's input files: configuration data plus the matching
/// model-deviation file, with the format tag needed to read the former.
///
/// Pairing the two paths in one handle (rather than walking parallel lists)
/// keeps a trajectory's identity explicit end to end.
#[derive(Debug, Clone)]
pub struct TrajSource {
    pub conf: PathBuf,
    pub fmt: ConfFormat,
    pub devi: PathBuf,
}

/// Orchestrates classification, bounded selection and dataset assembly for
/// one exploration iteration.
pub struct FrameSelector {
    trust: TrustLevel,
    cfg: SelectConfig,
    filters: ConfFilters,
}

impl FrameSelector {
    /// Create a selector with an empty filter chain.
    pub fn new(trust: TrustLevel, cfg: SelectConfig) -> Self {
        Self {
            trust,
            cfg,
            filters: ConfFilters::new(),
        }
    }

    /// Replace the post-classification filter chain.
    pub fn with_filters(mut self, filters: ConfFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Classify every trajectory and aggregate the reports, without
    /// selecting or assembling anything.
    pub fn survey(&self, sources: &[TrajSource], type_map: &[String]) -> Result<ExplorationReport> {
        let mut report = ExplorationReport::new();
        for (idx, src) in sources.iter().enumerate() {
            let traj_report = self.classify_one(idx, src, type_map)?;
            let counts = traj_report.counts();
            tracing::info!(
                traj = idx,
                path = %src.conf.display(),
                accurate = counts.accurate,
                candidate = counts.candidate,
                failed = counts.failed,
                "classified trajectory"
            );
            report.record(traj_report)?;
        }
        Ok(report)
    }

    /// Run a full selection: classify, select at most the configured number
    /// of candidates, assemble and persist them under `out_dir`.
    ///
    /// Returns the output path and the populated report, the audit record
    /// of this run.
    pub fn select(
        &self,
        sources: &[TrajSource],
        type_map: &[String],
        out_dir: &Path,
    ) -> Result<(PathBuf, ExplorationReport)> {
        let report = self.survey(sources, type_map)?;

        let picked = report.select_candidates(self.cfg.max_sel, self.cfg.seed);
        let totals = report.totals();
        tracing::info!(
            pool = totals.candidate,
            picked = picked.len(),
            max_sel = ?self.cfg.max_sel,
            seed = self.cfg.seed,
            "selected candidate frames"
        );

        let out = DatasetAssembler::new(&self.filters).assemble(
            &picked,
            sources,
            type_map,
            out_dir,
        )?;
        Ok((out, report))
    }

    fn classify_one(
        &self,
        idx: usize,
        src: &TrajSource,
        type_map: &[String],
    ) -> Result<TrajReport> {
        let frames = Frames::load(&src.conf, src.fmt, type_map)?;
        let devi = ModelDevi::load(&src.devi)?;
        if frames.nframes() != devi.nframes() {
            return Err(SiftError::ShapeMismatch {
                path: src.conf.clone(),
                conf_frames: frames.nframes(),
                devi_frames: devi.nframes(),
            });
        }
        let classes = classify(&devi, &self.trust);
        Ok(TrajReport::from_classes(idx, &classes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FrameRef;
    use crate::select::filter::MinDistanceFilter;

    use std::fmt::Write as _;
    use std::path::Path;

    /// Write a minimal orthogonal-box LAMMPS dump with one Ar atom per
    /// frame, its x coordinate equal to the frame index.
    fn write_dump(path: &Path, nframes: usize) {
        let mut text = String::new();
        for i in 0..nframes {
            let _ = write!(
                text,
                "ITEM: TIMESTEP\n{i}\nITEM: NUMBER OF ATOMS\n1\n\
                 ITEM: BOX BOUNDS pp pp pp\n0.0 10.0\n0.0 10.0\n0.0 10.0\n\
                 ITEM: ATOMS id type x y z\n1 1 {}.0 0.0 0.0\n",
                i
            );
        }
        std::fs::write(path, text).unwrap();
    }

    /// Write a model-deviation file with the given per-frame force maxima
    /// (virial maxima fixed at zero).
    fn write_devi(path: &Path, force_max: &[f64]) {
        let mut text = String::from(
            "# step max_devi_v min_devi_v avg_devi_v max_devi_f min_devi_f avg_devi_f\n",
        );
        for (i, f) in force_max.iter().enumerate() {
            let _ = writeln!(text, "{i} 0.0 0.0 0.0 {f} 0.0 0.0");
        }
        std::fs::write(path, text).unwrap();
    }

    fn ar_map() -> Vec<String> {
        vec!["Ar".to_string()]
    }

    fn source(dir: &Path, name: &str, force_max: &[f64]) -> TrajSource {
        let conf = dir.join(format!("{name}.dump"));
        let devi = dir.join(format!("{name}.devi"));
        write_dump(&conf, force_max.len());
        write_devi(&devi, force_max);
        TrajSource {
            conf,
            fmt: ConfFormat::LammpsDump,
            devi,
        }
    }

    fn selector() -> FrameSelector {
        let trust = TrustLevel::new(0.10, 0.25, None, None).unwrap();
        FrameSelector::new(trust, SelectConfig::default())
    }

    #[test]
    fn test_end_to_end_two_trajectories() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            source(dir.path(), "traj0", &[0.05, 0.15, 0.30]),
            source(dir.path(), "traj1", &[0.02, 0.12, 0.40]),
        ];
        let out_dir = dir.path().join("confs");

        let (out, report) = selector()
            .select(&sources, &ar_map(), &out_dir)
            .unwrap();

        let totals = report.totals();
        assert_eq!(totals.trajs, 2);
        assert_eq!(totals.accurate, 2);
        assert_eq!(totals.candidate, 2);
        assert_eq!(totals.failed, 2);

        assert_eq!(
            report.select_candidates(None, 0),
            vec![
                FrameRef { traj: 0, frame: 1 },
                FrameRef { traj: 1, frame: 1 }
            ]
        );

        // The dataset holds exactly frame 1 of each trajectory, in order:
        // both frames have x == 1.0 by construction.
        let coords = std::fs::read_to_string(out.join("Ar1").join("coord.raw")).unwrap();
        let lines: Vec<&str> = coords.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(line.starts_with("1e0 "), "unexpected coord line: {line}");
        }
    }

    #[test]
    fn test_zero_candidate_trajectory_is_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            // All frames accurate: contributes nothing.
            source(dir.path(), "calm", &[0.01, 0.02]),
            source(dir.path(), "hot", &[0.12, 0.20]),
        ];
        let out_dir = dir.path().join("confs");

        let (out, report) = selector()
            .select(&sources, &ar_map(), &out_dir)
            .unwrap();
        assert_eq!(report.totals().candidate, 2);

        let coords = std::fs::read_to_string(out.join("Ar1").join("coord.raw")).unwrap();
        assert_eq!(coords.lines().count(), 2);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "traj0", &[0.05, 0.15, 0.30]);
        // Rewrite the deviation file with one row too few.
        write_devi(&src.devi, &[0.05, 0.15]);

        let err = selector()
            .survey(&[src], &ar_map())
            .unwrap_err();
        assert!(matches!(
            err,
            SiftError::ShapeMismatch {
                conf_frames: 3,
                devi_frames: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_bounded_selection_caps_dataset() {
        let dir = tempfile::tempdir().unwrap();
        // Ten candidate frames in one trajectory.
        let sources = vec![source(dir.path(), "traj0", &[0.15; 10])];
        let out_dir = dir.path().join("confs");

        let trust = TrustLevel::new(0.10, 0.25, None, None).unwrap();
        let cfg = SelectConfig::new(Some(4), 9).unwrap();
        let (out, report) = FrameSelector::new(trust, cfg)
            .select(&sources, &ar_map(), &out_dir)
            .unwrap();

        assert_eq!(report.totals().candidate, 10);
        let coords = std::fs::read_to_string(out.join("Ar1").join("coord.raw")).unwrap();
        assert_eq!(coords.lines().count(), 4);
    }

    #[test]
    fn test_filter_chain_prunes_dataset_not_report() {
        let dir = tempfile::tempdir().unwrap();
        // Two atoms 0.2 apart in every frame: the min-distance filter
        // rejects all of them.
        let conf = dir.path().join("close.dump");
        let text = "ITEM: TIMESTEP\n0\nITEM: NUMBER OF ATOMS\n2\n\
                    ITEM: BOX BOUNDS pp pp pp\n0.0 10.0\n0.0 10.0\n0.0 10.0\n\
                    ITEM: ATOMS id type x y z\n1 1 0.0 0.0 0.0\n2 1 0.2 0.0 0.0\n";
        std::fs::write(&conf, text).unwrap();
        let devi = dir.path().join("close.devi");
        write_devi(&devi, &[0.15]);

        let sources = vec![TrajSource {
            conf,
            fmt: ConfFormat::LammpsDump,
            devi,
        }];
        let out_dir = dir.path().join("confs");

        let trust = TrustLevel::new(0.10, 0.25, None, None).unwrap();
        let selector = FrameSelector::new(trust, SelectConfig::default())
            .with_filters(ConfFilters::new().with(MinDistanceFilter::new(0.5)));

        let (out, report) = selector.select(&sources, &ar_map(), &out_dir).unwrap();
        // The report still counts the candidate; the dataset is empty.
        assert_eq!(report.totals().candidate, 1);
        assert!(!out.join("Ar2").exists());
        assert!(out.join("dataset.json").exists());
    }

    #[test]
    fn test_missing_devi_file_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "traj0", &[0.15]);
        std::fs::remove_file(&src.devi).unwrap();

        let err = selector().survey(&[src], &ar_map()).unwrap_err();
        match err {
            SiftError::Load { path, .. } => assert!(path.ends_with("traj0.devi")),
            other => panic!("expected Load error, got {other:?}"),
        }
    }
}
