//! # Constants and type definitions for Almanac
//!
//! This module centralizes the **numbering conventions**, **sentinel values**, and **common type
//! definitions** used throughout the `almanac` library. It also defines the small site-level
//! enumerations (observatory, detector chip) shared by discovery, reconciliation, and target
//! attachment.
//!
//! ## Overview
//!
//! - Exposure numbering arithmetic (night prefix, baseline)
//! - Sentinel values used when a header field cannot be coerced
//! - Core type aliases used across the crate
//! - Site identifiers and per-site era thresholds
//!
//! These definitions are used by all main modules, including reconciliation, sequence
//! detection, and fiber-map attachment.

use std::str::FromStr;

use crate::almanac_errors::AlmanacError;

// -------------------------------------------------------------------------------------------------
// Exposure numbering
// -------------------------------------------------------------------------------------------------

/// MJD at which the absolute exposure numbering scheme starts.
pub const EXPOSURE_NUMBERING_EPOCH_MJD: Mjd = 55_562;

/// Width of the per-night exposure number block.
pub const EXPOSURES_PER_NIGHT: i64 = 10_000;

/// Number of detector chips read out per exposure.
pub const CHIP_COUNT: usize = 3;

/// Bytes of a raw exposure file scanned for header cards.
pub const HEADER_SCAN_BYTES: usize = 20_000;

/// Identifier sentinel for a field that was absent from the header.
pub const ID_ABSENT: i64 = -1;

/// Identifier sentinel for a field that was present but unparsable.
pub const ID_UNPARSABLE: i64 = -999;

/// Sentinel for an unresolved master catalog identifier.
pub const SDSS_ID_UNRESOLVED: i64 = -1;

/// Maximum number of identifiers sent to the resolver in one batched query.
pub const RESOLVER_CHUNK_SIZE: usize = 10_000;

/// Coordinate tolerance (degrees) for matching planned holes to plugged holes.
pub const PLUG_MATCH_TOLERANCE: f64 = 1e-5;

/// Night prefix of the absolute exposure numbering for a given MJD.
///
/// The baseline exposure number of a night is `night_prefix(mjd)` (suffix `0000`);
/// the first real exposure of the night is conventionally `night_prefix(mjd) + 1`.
pub fn night_prefix(mjd: Mjd) -> ExposureNumber {
    ((mjd - EXPOSURE_NUMBERING_EPOCH_MJD) * EXPOSURES_PER_NIGHT).max(0)
}

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Modified Julian Date of a night (integer days)
pub type Mjd = i64;
/// Absolute exposure number (night prefix + per-night counter)
pub type ExposureNumber = i64;

// -------------------------------------------------------------------------------------------------
// Sites and chips
// -------------------------------------------------------------------------------------------------

/// An observing site hosting one spectrograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Observatory {
    /// Apache Point Observatory (northern site)
    Apo,
    /// Las Campanas Observatory (southern site)
    Lco,
}

impl Observatory {
    /// All sites, in conventional order.
    pub const ALL: [Observatory; 2] = [Observatory::Apo, Observatory::Lco];

    /// Basename prefix of raw exposure files written at this site.
    pub fn raw_prefix(&self) -> &'static str {
        match self {
            Observatory::Apo => "apR",
            Observatory::Lco => "asR",
        }
    }

    /// First MJD of the robotic fiber-positioner era at this site.
    ///
    /// Exposures on or after this night carry a positioner configuration id
    /// instead of a plugged-plate id.
    pub fn fps_era_start(&self) -> Mjd {
        match self {
            Observatory::Apo => 59_550,
            Observatory::Lco => 59_550,
        }
    }

    /// Lowercase site name used in paths and output groups.
    pub fn name(&self) -> &'static str {
        match self {
            Observatory::Apo => "apo",
            Observatory::Lco => "lco",
        }
    }
}

impl std::fmt::Display for Observatory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Observatory {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apo" => Ok(Observatory::Apo),
            "lco" => Ok(Observatory::Lco),
            other => Err(AlmanacError::UnknownObservatory(other.to_string())),
        }
    }
}

/// One of the three detector chips read out per exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Chip {
    A,
    B,
    C,
}

impl Chip {
    /// All chips, in readout order.
    pub const ALL: [Chip; CHIP_COUNT] = [Chip::A, Chip::B, Chip::C];

    /// Single-letter chip label used in raw file basenames.
    pub fn letter(&self) -> char {
        match self {
            Chip::A => 'a',
            Chip::B => 'b',
            Chip::C => 'c',
        }
    }

    /// Index of this chip in presence-flag vectors.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_letter(c: char) -> Option<Chip> {
        match c {
            'a' => Some(Chip::A),
            'b' => Some(Chip::B),
            'c' => Some(Chip::C),
            _ => None,
        }
    }
}

/// Plugging intervals (inclusive MJD ranges) at APO during which plate fibers were
/// miswired and recorded fiber ids must be reflected across the harness.
pub const APO_MISWIRED_PLUG_MJD_RANGES: [(Mjd, Mjd); 2] = [(56_848, 56_860), (57_600, 57_622)];

/// Highest plate fiber id; miswired ranges reflect ids as `MAX + 1 - fiber_id`.
pub const PLATE_FIBER_ID_MAX: i64 = 300;

#[cfg(test)]
mod constants_test {
    use super::*;

    #[test]
    fn test_night_prefix() {
        assert_eq!(night_prefix(55_562), 0);
        assert_eq!(night_prefix(55_563), 10_000);
        assert_eq!(night_prefix(59_558), 39_960_000);
        // Nights before the numbering epoch clamp to zero.
        assert_eq!(night_prefix(50_000), 0);
    }

    #[test]
    fn test_observatory_round_trip() {
        for obs in Observatory::ALL {
            assert_eq!(obs.name().parse::<Observatory>().unwrap(), obs);
        }
        assert!("mro".parse::<Observatory>().is_err());
    }

    #[test]
    fn test_chip_letters() {
        for (i, chip) in Chip::ALL.iter().enumerate() {
            assert_eq!(chip.index(), i);
            assert_eq!(Chip::from_letter(chip.letter()), Some(*chip));
        }
        assert_eq!(Chip::from_letter('d'), None);
    }
}
