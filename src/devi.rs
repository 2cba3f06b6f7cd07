//! Model-deviation file parsing.
//!
//! The MD engine writes one text file per trajectory with a row per frame:
//!
//! ```text
//! # step  max_devi_v  min_devi_v  avg_devi_v  max_devi_f  min_devi_f  avg_devi_f
//!      0  1.0e-02     2.0e-03     5.0e-03     4.0e-02     1.0e-02     2.0e-02
//! ```
//!
//! Classification consumes only the two `max` columns: the force maximum is
//! the primary uncertainty metric, the virial maximum the secondary one.
//! The remaining columns are parsed for validation and discarded.

use std::path::Path;

use crate::error::{Result, SiftError};

/// Column index of the per-frame virial-deviation maximum.
const COL_VIRIAL_MAX: usize = 1;
/// Column index of the per-frame force-deviation maximum.
const COL_FORCE_MAX: usize = 4;
/// Minimum number of numeric columns per row.
const MIN_COLS: usize = 7;

/// Per-frame uncertainty metrics extracted from one model-deviation file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDevi {
    /// Maximum force deviation per frame (primary metric).
    pub force_max: Vec<f64>,
    /// Maximum virial deviation per frame (secondary metric).
    pub virial_max: Vec<f64>,
}

impl ModelDevi {
    /// Number of frames covered by this file.
    pub fn nframes(&self) -> usize {
        self.force_max.len()
    }

    /// Parse a model-deviation file from disk.
    ///
    /// Lines starting with `#` are headers and are skipped. Every remaining
    /// non-empty line must carry at least [`MIN_COLS`] numeric fields.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SiftError::load(path, format!("cannot read file: {e}")))?;
        Self::parse(&text).map_err(|reason| SiftError::load(path, reason))
    }

    /// Parse model-deviation rows from text. Returns a reason string on
    /// failure so the caller can attach the file path.
    pub(crate) fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut force_max = Vec::new();
        let mut virial_max = Vec::new();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<f64> = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|_| format!("line {}: non-numeric field {tok:?}", lineno + 1))
                })
                .collect::<std::result::Result<_, _>>()?;
            if fields.len() < MIN_COLS {
                return Err(format!(
                    "line {}: expected at least {MIN_COLS} columns, found {}",
                    lineno + 1,
                    fields.len()
                ));
            }
            virial_max.push(fields[COL_VIRIAL_MAX]);
            force_max.push(fields[COL_FORCE_MAX]);
        }

        Ok(Self {
            force_max,
            virial_max,
        })
    }
}
