//! Species-grouped raw-text persistence for assembled datasets.
//!
//! The on-disk layout is one directory per chemical formula, each holding
//! the raw text files downstream labeling jobs consume, plus a top-level
//! JSON manifest that makes the dataset self-describing:
//!
//! ```text
//! out/
//!   dataset.json        manifest: type map, per-system frame counts, timestamp
//!   O1H2/
//!     type_map.raw      one species name per line
//!     type.raw          one species index per atom per line
//!     box.raw           9 cell components per frame per line
//!     coord.raw         3*natoms coordinates per frame per line
//!   ...
//! ```
//!
//! The output directory is created if absent and reused (never purged) if it
//! already exists.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};

use super::{Frames, MultiFrames};

/// Top-level manifest written next to the per-formula directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// UTC time the dataset was written.
    pub created_at: DateTime<Utc>,
    /// Species table shared by all systems.
    pub type_map: Vec<String>,
    /// One entry per formula directory.
    pub systems: Vec<SystemEntry>,
}

/// Manifest entry for one formula group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEntry {
    pub formula: String,
    pub nframes: usize,
    pub natoms: usize,
}

impl MultiFrames {
    /// Persist all formula groups under `dir` in the raw-text layout.
    ///
    /// Returns the manifest path. Fails with [`SiftError::Io`] if the
    /// directory or any file cannot be written.
    pub fn to_deepmd_raw(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| SiftError::io(dir, e))?;

        let mut entries = Vec::new();
        for (formula, system) in self.iter() {
            let sys_dir = dir.join(formula);
            write_system(&sys_dir, system)?;
            entries.push(SystemEntry {
                formula: formula.to_string(),
                nframes: system.nframes(),
                natoms: system.natoms(),
            });
            tracing::info!(
                formula,
                nframes = system.nframes(),
                natoms = system.natoms(),
                "wrote system"
            );
        }

        let manifest = DatasetManifest {
            created_at: Utc::now(),
            type_map: self.type_map().to_vec(),
            systems: entries,
        };
        let manifest_path = dir.join("dataset.json");
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| SiftError::io(&manifest_path, std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        std::fs::write(&manifest_path, json).map_err(|e| SiftError::io(&manifest_path, e))?;

        Ok(manifest_path)
    }
}

fn write_system(dir: &Path, system: &Frames) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| SiftError::io(dir, e))?;

    let mut type_map = String::new();
    for name in system.type_map() {
        type_map.push_str(name);
        type_map.push('\n');
    }
    write_file(&dir.join("type_map.raw"), &type_map)?;

    let mut types = String::new();
    for t in system.atom_types() {
        let _ = writeln!(types, "{t}");
    }
    write_file(&dir.join("type.raw"), &types)?;

    let mut boxes = String::new();
    let mut coords = String::new();
    for frame in system.frames() {
        let cells = frame.cell.iter().flatten();
        boxes.push_str(&join_floats(cells));
        boxes.push('\n');
        coords.push_str(&join_floats(frame.coords.iter().flatten()));
        coords.push('\n');
    }
    write_file(&dir.join("box.raw"), &boxes)?;
    write_file(&dir.join("coord.raw"), &coords)?;
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| SiftError::io(path, e))
}

fn join_floats<'a>(vals: impl Iterator<Item = &'a f64>) -> String {
    let mut out = String::new();
    for (i, v) in vals.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{v:e}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::Frame;

    fn sample_multi() -> MultiFrames {
        let type_map = vec!["O".to_string(), "H".to_string()];
        let frames = vec![
            Frame {
                cell: [[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]],
                coords: vec![[0.0; 3], [0.96, 0.0, 0.0], [-0.24, 0.93, 0.0]],
            },
            Frame {
                cell: [[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]],
                coords: vec![[0.1; 3], [1.06, 0.1, 0.1], [-0.14, 1.03, 0.1]],
            },
        ];
        let system = Frames::new(type_map.clone(), vec![0, 1, 1], frames).unwrap();
        let mut ms = MultiFrames::new(type_map);
        ms.append(system).unwrap();
        ms
    }

    #[test]
    fn test_write_layout() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = sample_multi().to_deepmd_raw(dir.path()).unwrap();

        assert!(manifest_path.ends_with("dataset.json"));
        let sys_dir = dir.path().join("O1H2");
        for f in ["type_map.raw", "type.raw", "box.raw", "coord.raw"] {
            assert!(sys_dir.join(f).exists(), "missing {f}");
        }

        let types = std::fs::read_to_string(sys_dir.join("type.raw")).unwrap();
        assert_eq!(types.lines().collect::<Vec<_>>(), vec!["0", "1", "1"]);

        // One line per frame, 3 atoms * 3 coordinates per line.
        let coords = std::fs::read_to_string(sys_dir.join("coord.raw")).unwrap();
        assert_eq!(coords.lines().count(), 2);
        assert_eq!(coords.lines().next().unwrap().split(' ').count(), 9);

        let boxes = std::fs::read_to_string(sys_dir.join("box.raw")).unwrap();
        assert_eq!(boxes.lines().next().unwrap().split(' ').count(), 9);
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = sample_multi().to_deepmd_raw(dir.path()).unwrap();

        let text = std::fs::read_to_string(manifest_path).unwrap();
        let manifest: DatasetManifest = serde_json::from_str(&text).unwrap();
        assert_eq!(manifest.type_map, vec!["O", "H"]);
        assert_eq!(manifest.systems.len(), 1);
        assert_eq!(manifest.systems[0].formula, "O1H2");
        assert_eq!(manifest.systems[0].nframes, 2);
        assert_eq!(manifest.systems[0].natoms, 3);
    }

    #[test]
    fn test_existing_dir_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("keep.txt");
        std::fs::write(&marker, "untouched").unwrap();

        sample_multi().to_deepmd_raw(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "untouched");
    }
}
