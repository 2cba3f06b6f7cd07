//! Atomic-configuration containers and format backends.
//!
//! This module provides:
//! - [`Frames`] -- one trajectory's parsed configurations: a shared species
//!   table, a fixed per-atom species assignment, and per-frame cell +
//!   coordinates. Supports ordered sub-extraction via [`Frames::sub_frames`].
//! - [`MultiFrames`] -- the multi-trajectory accumulator, grouping systems by
//!   chemical formula, persisted by [`deepmd`] in a species-grouped raw-text
//!   layout.
//! - Format backends ([`dump`], [`xyz`]), selected at runtime by
//!   [`ConfFormat`], so that the selection pipeline stays independent of the
//!   trajectory file format.
//!
//! Readers normalize atom order by (species, input order) at load time, so
//! systems with the same formula coming from different trajectories always
//! merge consistently.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};

pub mod deepmd;
pub mod dump;
pub mod xyz;

// ---------------------------------------------------------------------------
// Format tag
// ---------------------------------------------------------------------------

/// Supported trajectory file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfFormat {
    /// LAMMPS text dump (`lammps/dump`), the default.
    LammpsDump,
    /// Extended XYZ (`xyz`).
    Xyz,
}

impl FromStr for ConfFormat {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lammps/dump" | "dump" => Ok(Self::LammpsDump),
            "xyz" | "extxyz" => Ok(Self::Xyz),
            other => Err(SiftError::InvalidArgument(format!(
                "unknown trajectory format {other:?} (expected \"lammps/dump\" or \"xyz\")"
            ))),
        }
    }
}

impl std::fmt::Display for ConfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LammpsDump => write!(f, "lammps/dump"),
            Self::Xyz => write!(f, "xyz"),
        }
    }
}

// ---------------------------------------------------------------------------
// Single-trajectory container
// ---------------------------------------------------------------------------

/// One frame: simulation cell plus atomic coordinates.
///
/// The cell is a row-major 3x3 matrix of lattice vectors; `coords` holds one
/// cartesian position per atom, in the normalized atom order of the owning
/// [`Frames`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub cell: [[f64; 3]; 3],
    pub coords: Vec<[f64; 3]>,
}

/// A trajectory's worth of atomic configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frames {
    /// Species names; per-atom types below index into this table.
    type_map: Vec<String>,
    /// Species index of each atom, constant across all frames.
    atom_types: Vec<usize>,
    /// Ordered frames.
    frames: Vec<Frame>,
}

impl Frames {
    /// Build a container from already-normalized parts.
    ///
    /// Every frame must carry exactly `atom_types.len()` coordinates and
    /// every atom type must index into `type_map`.
    pub fn new(type_map: Vec<String>, atom_types: Vec<usize>, frames: Vec<Frame>) -> Result<Self> {
        if let Some(&bad) = atom_types.iter().find(|&&t| t >= type_map.len()) {
            return Err(SiftError::InvalidArgument(format!(
                "atom type {bad} is outside the {}-entry type map",
                type_map.len()
            )));
        }
        if let Some(frame) = frames.iter().find(|fr| fr.coords.len() != atom_types.len()) {
            return Err(SiftError::InvalidArgument(format!(
                "frame has {} coordinates for {} atoms",
                frame.coords.len(),
                atom_types.len()
            )));
        }
        Ok(Self {
            type_map,
            atom_types,
            frames,
        })
    }

    /// Load a trajectory file in the given format.
    pub fn load(path: &Path, fmt: ConfFormat, type_map: &[String]) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SiftError::load(path, format!("cannot read file: {e}")))?;
        let parsed = match fmt {
            ConfFormat::LammpsDump => dump::parse(&text, type_map),
            ConfFormat::Xyz => xyz::parse(&text, type_map),
        };
        parsed.map_err(|reason| SiftError::load(path, reason))
    }

    /// Number of frames.
    pub fn nframes(&self) -> usize {
        self.frames.len()
    }

    /// Number of atoms per frame.
    pub fn natoms(&self) -> usize {
        self.atom_types.len()
    }

    /// Whether the container holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The species table.
    pub fn type_map(&self) -> &[String] {
        &self.type_map
    }

    /// Per-atom species indices.
    pub fn atom_types(&self) -> &[usize] {
        &self.atom_types
    }

    /// The frames themselves.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Chemical formula in type-map order, e.g. `"C1H4"`.
    ///
    /// Species with zero atoms are omitted, so the formula is a stable
    /// grouping key across trajectories sharing a type map.
    pub fn formula(&self) -> String {
        let mut counts = vec![0usize; self.type_map.len()];
        for &t in &self.atom_types {
            counts[t] += 1;
        }
        let mut out = String::new();
        for (name, count) in self.type_map.iter().zip(&counts) {
            if *count > 0 {
                out.push_str(name);
                out.push_str(&count.to_string());
            }
        }
        out
    }

    /// Extract the given frames, preserving their order, into a new
    /// container.
    pub fn sub_frames(&self, indices: &[usize]) -> Result<Self> {
        let mut picked = Vec::with_capacity(indices.len());
        for &i in indices {
            let frame = self.frames.get(i).ok_or_else(|| {
                SiftError::InvalidArgument(format!(
                    "frame index {i} out of range for {}-frame trajectory",
                    self.frames.len()
                ))
            })?;
            picked.push(frame.clone());
        }
        Ok(Self {
            type_map: self.type_map.clone(),
            atom_types: self.atom_types.clone(),
            frames: picked,
        })
    }

    /// Drop all frames whose index is not in `keep` (ascending retain,
    /// used by the post-classification filter chain).
    pub fn retain_frames(&mut self, keep: &[bool]) {
        let mut it = keep.iter();
        self.frames.retain(|_| *it.next().unwrap_or(&true));
    }
}

// ---------------------------------------------------------------------------
// Multi-trajectory accumulator
// ---------------------------------------------------------------------------

/// An accumulating set of systems grouped by chemical formula.
///
/// Appending a [`Frames`] whose formula is already present concatenates its
/// frames onto the existing system; a new formula opens a new group. All
/// appended systems must share the accumulator's type map.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFrames {
    type_map: Vec<String>,
    systems: BTreeMap<String, Frames>,
}

impl MultiFrames {
    /// Create an empty accumulator for the given species table.
    pub fn new(type_map: Vec<String>) -> Self {
        Self {
            type_map,
            systems: BTreeMap::new(),
        }
    }

    /// Append one system, merging into an existing formula group if present.
    pub fn append(&mut self, frames: Frames) -> Result<()> {
        if frames.type_map() != self.type_map.as_slice() {
            return Err(SiftError::InvalidArgument(format!(
                "type map mismatch: dataset uses {:?}, system uses {:?}",
                self.type_map,
                frames.type_map()
            )));
        }
        if frames.is_empty() {
            return Ok(());
        }
        let formula = frames.formula();
        match self.systems.get_mut(&formula) {
            Some(existing) => {
                debug_assert_eq!(existing.atom_types(), frames.atom_types());
                existing.frames.extend(frames.frames);
            }
            None => {
                self.systems.insert(formula, frames);
            }
        }
        Ok(())
    }

    /// The species table shared by all systems.
    pub fn type_map(&self) -> &[String] {
        &self.type_map
    }

    /// Formula keys in sorted order.
    pub fn formulas(&self) -> Vec<&str> {
        self.systems.keys().map(String::as_str).collect()
    }

    /// Look up one formula group.
    pub fn get(&self, formula: &str) -> Option<&Frames> {
        self.systems.get(formula)
    }

    /// Iterate over (formula, system) pairs in sorted formula order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Frames)> {
        self.systems.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Total frame count across all formula groups.
    pub fn nframes_total(&self) -> usize {
        self.systems.values().map(Frames::nframes).sum()
    }

    /// Whether no frames have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
