//! Selection policy configuration: trust-level bands and the selection cap.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};

/// Complete configuration for a selection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiftConfig {
    pub trust: TrustLevel,
    pub select: SelectConfig,
}

/// Uncertainty thresholds separating trustworthy, borderline and unusable
/// frames.
///
/// The force band is mandatory; the virial band is optional and only active
/// when both of its bounds are supplied. Within a band, a frame with
/// deviation `v` is accurate if `v < lo`, a labeling candidate if
/// `lo <= v < hi`, and failed if `v >= hi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustLevel {
    /// Lower force-deviation threshold (default: 0.05).
    pub force_lo: f64,
    /// Upper force-deviation threshold (default: 0.15).
    pub force_hi: f64,
    /// Lower virial-deviation threshold, if the virial band is used.
    #[serde(default)]
    pub virial_lo: Option<f64>,
    /// Upper virial-deviation threshold, if the virial band is used.
    #[serde(default)]
    pub virial_hi: Option<f64>,
}

impl TrustLevel {
    /// Build a trust level, validating both bands.
    ///
    /// Fails if `force_lo > force_hi`, if only one virial bound is given, or
    /// if `virial_lo > virial_hi`.
    pub fn new(
        force_lo: f64,
        force_hi: f64,
        virial_lo: Option<f64>,
        virial_hi: Option<f64>,
    ) -> Result<Self> {
        if force_lo > force_hi {
            return Err(SiftError::Config(format!(
                "force band is inverted: lo {force_lo} > hi {force_hi}"
            )));
        }
        match (virial_lo, virial_hi) {
            (Some(lo), Some(hi)) if lo > hi => {
                return Err(SiftError::Config(format!(
                    "virial band is inverted: lo {lo} > hi {hi}"
                )));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(SiftError::Config(
                    "virial band needs both bounds or neither".to_string(),
                ));
            }
            _ => {}
        }
        Ok(Self {
            force_lo,
            force_hi,
            virial_lo,
            virial_hi,
        })
    }

    /// Whether the optional virial band is active.
    pub fn has_virial(&self) -> bool {
        self.virial_lo.is_some() && self.virial_hi.is_some()
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        Self {
            force_lo: 0.05,
            force_hi: 0.15,
            virial_lo: None,
            virial_hi: None,
        }
    }
}

/// Per-run selection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectConfig {
    /// Cap on the total number of candidate frames selected this run.
    /// `None` selects the whole candidate pool.
    pub max_sel: Option<usize>,
    /// Seed for the bounded subsampling draw. The same seed over the same
    /// pool reproduces the same selection.
    pub seed: u64,
}

impl SelectConfig {
    /// Build a selection config from the raw orchestration-layer cap.
    ///
    /// The cap arrives as a signed integer; a negative value is rejected
    /// with [`SiftError::InvalidArgument`] rather than wrapped.
    pub fn new(max_sel: Option<i64>, seed: u64) -> Result<Self> {
        let max_sel = match max_sel {
            Some(n) if n < 0 => {
                return Err(SiftError::InvalidArgument(format!(
                    "selection cap must be non-negative, got {n}"
                )));
            }
            Some(n) => Some(n as usize),
            None => None,
        };
        Ok(Self { max_sel, seed })
    }
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            max_sel: None,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_level_valid() {
        let tl = TrustLevel::new(0.05, 0.15, None, None).unwrap();
        assert!(!tl.has_virial());

        let tl = TrustLevel::new(0.05, 0.15, Some(0.1), Some(0.3)).unwrap();
        assert!(tl.has_virial());
    }

    #[test]
    fn test_trust_level_inverted_force_band() {
        let err = TrustLevel::new(0.2, 0.1, None, None).unwrap_err();
        assert!(matches!(err, SiftError::Config(_)));
    }

    #[test]
    fn test_trust_level_inverted_virial_band() {
        let err = TrustLevel::new(0.05, 0.15, Some(0.4), Some(0.2)).unwrap_err();
        assert!(matches!(err, SiftError::Config(_)));
    }

    #[test]
    fn test_trust_level_half_virial_band() {
        let err = TrustLevel::new(0.05, 0.15, Some(0.1), None).unwrap_err();
        assert!(matches!(err, SiftError::Config(_)));
        let err = TrustLevel::new(0.05, 0.15, None, Some(0.3)).unwrap_err();
        assert!(matches!(err, SiftError::Config(_)));
    }

    #[test]
    fn test_trust_level_equal_bounds_ok() {
        // lo == hi is degenerate but legal: everything below is accurate,
        // everything at or above fails.
        let tl = TrustLevel::new(0.1, 0.1, None, None).unwrap();
        assert_eq!(tl.force_lo, tl.force_hi);
    }

    #[test]
    fn test_select_config_negative_cap() {
        let err = SelectConfig::new(Some(-1), 0).unwrap_err();
        assert!(matches!(err, SiftError::InvalidArgument(_)));
    }

    #[test]
    fn test_select_config_cap_conversion() {
        let cfg = SelectConfig::new(Some(25), 7).unwrap();
        assert_eq!(cfg.max_sel, Some(25));
        assert_eq!(cfg.seed, 7);

        let cfg = SelectConfig::new(None, 0).unwrap();
        assert_eq!(cfg.max_sel, None);
    }
}
