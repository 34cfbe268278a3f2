//! # The fiber-map file boundary
//!
//! Fiber maps live in external file formats (positioner configuration summaries,
//! drilling files, plug maps) whose parsing is not this crate's business. The
//! [`TargetSource`] trait is the seam: implementations turn an identifier into a
//! list of already-parsed records, and the attachment logic neither knows nor
//! cares where they came from.
//!
//! The path conventions those files follow on disk are stable enough to be worth
//! encoding here, so implementations and operators agree on locations.

use camino::Utf8PathBuf;

use crate::almanac_errors::AlmanacError;
use crate::config::AlmanacConfig;
use crate::constants::{Mjd, Observatory};
use crate::targets::fps::FpsTarget;
use crate::targets::plate::{PlannedHole, PluggedHole};

/// External provider of parsed fiber-map records.
pub trait TargetSource {
    /// Targets of one positioner configuration (FPS era).
    fn fps_targets(
        &self,
        observatory: Observatory,
        config_id: i64,
    ) -> Result<Vec<FpsTarget>, AlmanacError>;

    /// Planned (drilled) holes of one plate.
    fn planned_holes(&self, plate_id: i64) -> Result<Vec<PlannedHole>, AlmanacError>;

    /// Measured plug map of one plate plugging.
    fn plugged_holes(
        &self,
        observatory: Observatory,
        plugged_mjd: Mjd,
        plate_id: i64,
        iteration: &str,
    ) -> Result<Vec<PluggedHole>, AlmanacError>;
}

/// Source used when no fiber-map tree is mounted: every lookup is unavailable,
/// which attachment degrades to empty target lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTargetSource;

impl TargetSource for NoTargetSource {
    fn fps_targets(
        &self,
        observatory: Observatory,
        config_id: i64,
    ) -> Result<Vec<FpsTarget>, AlmanacError> {
        Err(AlmanacError::TargetFileUnavailable(format!(
            "no target source configured (fps config {config_id} at {observatory})"
        )))
    }

    fn planned_holes(&self, plate_id: i64) -> Result<Vec<PlannedHole>, AlmanacError> {
        Err(AlmanacError::TargetFileUnavailable(format!(
            "no target source configured (plate {plate_id})"
        )))
    }

    fn plugged_holes(
        &self,
        observatory: Observatory,
        plugged_mjd: Mjd,
        plate_id: i64,
        _iteration: &str,
    ) -> Result<Vec<PluggedHole>, AlmanacError> {
        Err(AlmanacError::TargetFileUnavailable(format!(
            "no target source configured (plug map {plate_id}-{plugged_mjd} at {observatory})"
        )))
    }
}

/// Path of a plate's drilling file: `<platelist>/<plate/100>XX/<plate>/plateHoles-<plate>.par`.
pub fn plate_holes_path(config: &AlmanacConfig, plate_id: i64) -> Utf8PathBuf {
    let plate = format!("{plate_id:06}");
    config
        .platelist_dir
        .join(format!("{}XX", &plate[..4]))
        .join(&plate)
        .join(format!("plateHoles-{plate}.par"))
}

/// Path of a measured plug map:
/// `<mapper>/<observatory>/<plugged_mjd>/plPlugMapM-<plate>-<plugged_mjd>-<iteration>.par`.
pub fn plug_map_path(
    config: &AlmanacConfig,
    observatory: Observatory,
    plugged_mjd: Mjd,
    plate_id: i64,
    iteration: &str,
) -> Utf8PathBuf {
    config
        .mapper_dir
        .join(observatory.name())
        .join(plugged_mjd.to_string())
        .join(format!("plPlugMapM-{plate_id}-{plugged_mjd}-{iteration}.par"))
}

/// Directory of a positioner configuration summary:
/// `<summary>/<observatory>/<config/1000>XXX/<config/100>XX/`.
pub fn config_summary_dir(
    config: &AlmanacConfig,
    observatory: Observatory,
    config_id: i64,
) -> Utf8PathBuf {
    let id = config_id.to_string();
    let thousands = if id.len() > 3 { &id[..id.len() - 3] } else { "" };
    let hundreds = if id.len() > 2 { &id[..id.len() - 2] } else { "" };
    config
        .summary_dir
        .join(observatory.name())
        .join(format!("{:0>3}XXX", thousands))
        .join(format!("{:0>4}XX", hundreds))
}

#[cfg(test)]
mod source_test {
    use super::*;

    #[test]
    fn test_plate_holes_path() {
        let config = AlmanacConfig::default();
        assert_eq!(
            plate_holes_path(&config, 8297),
            Utf8PathBuf::from("/data/platelist/0082XX/008297/plateHoles-008297.par")
        );
    }

    #[test]
    fn test_plug_map_path() {
        let config = AlmanacConfig::default();
        assert_eq!(
            plug_map_path(&config, Observatory::Apo, 57_131, 8297, "01"),
            Utf8PathBuf::from("/data/mapper/apo/57131/plPlugMapM-8297-57131-01.par")
        );
    }

    #[test]
    fn test_config_summary_dir() {
        let config = AlmanacConfig::default();
        assert_eq!(
            config_summary_dir(&config, Observatory::Apo, 123_456),
            Utf8PathBuf::from("/data/summary_files/apo/123XXX/1234XX")
        );
        assert_eq!(
            config_summary_dir(&config, Observatory::Lco, 42),
            Utf8PathBuf::from("/data/summary_files/lco/000XXX/0000XX")
        );
    }
}
