//! # Almanac configuration
//!
//! Filesystem roots and per-site thresholds, loaded from
//! `<config dir>/almanac/config.toml` when present and falling back to compiled-in
//! defaults otherwise. The configuration is plain data: it is cheap to clone and is
//! owned by each [`Almanac`](crate::almanac::Almanac) instance, so concurrent
//! per-night workers never share mutable state through it.

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::almanac_errors::AlmanacError;
use crate::constants::{Mjd, Observatory};

/// Per-site MJD thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMjd {
    pub apo: Mjd,
    pub lco: Mjd,
}

impl SiteMjd {
    pub fn get(&self, observatory: Observatory) -> Mjd {
        match observatory {
            Observatory::Apo => self.apo,
            Observatory::Lco => self.lco,
        }
    }
}

/// Almanac settings: data roots and the coverage start of the operations database.
///
/// All fields have defaults so that an absent configuration file is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlmanacConfig {
    /// Root of the raw exposure tree (`<data_dir>/<observatory>/<mjd>/...`).
    pub data_dir: Utf8PathBuf,

    /// Root of the drilled-plate hole files.
    pub platelist_dir: Utf8PathBuf,

    /// Root of the per-night plug-map files.
    pub mapper_dir: Utf8PathBuf,

    /// Root of the positioner configuration summary files.
    pub summary_dir: Utf8PathBuf,

    /// First night per site for which the operations database is trusted to
    /// hold a record of every exposure. A missing record on an earlier night
    /// is unremarkable; on a later night it is suspicious.
    pub expected_coverage_start: SiteMjd,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        AlmanacConfig {
            data_dir: Utf8PathBuf::from("/data/spectro/raw"),
            platelist_dir: Utf8PathBuf::from("/data/platelist"),
            mapper_dir: Utf8PathBuf::from("/data/mapper"),
            summary_dir: Utf8PathBuf::from("/data/summary_files"),
            expected_coverage_start: SiteMjd {
                apo: 59_558,
                lco: 59_558,
            },
        }
    }
}

impl AlmanacConfig {
    /// Load the configuration from the per-user config directory.
    ///
    /// A missing file yields the defaults; an unreadable or syntactically invalid
    /// file is an error (a half-applied configuration is worse than none).
    pub fn load() -> Result<Self, AlmanacError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_toml_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse a configuration from a TOML file at an explicit path.
    pub fn from_toml_path(path: &Utf8PathBuf) -> Result<Self, AlmanacError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| AlmanacError::MalformedConfig(format!("{path}: {e}")))
    }

    /// Location of the user configuration file, if a home directory exists.
    pub fn config_path() -> Option<Utf8PathBuf> {
        let dirs = ProjectDirs::from("", "", "almanac")?;
        let path = dirs.config_dir().join("config.toml");
        Utf8PathBuf::from_path_buf(path).ok()
    }

    /// Directory holding one night of raw exposures.
    pub fn night_dir(&self, observatory: Observatory, mjd: Mjd) -> Utf8PathBuf {
        self.data_dir.join(observatory.name()).join(mjd.to_string())
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = AlmanacConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: AlmanacConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AlmanacConfig = toml::from_str(
            r#"
            data_dir = "/tmp/raw"

            [expected_coverage_start]
            apo = 60000
            lco = 59558
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, Utf8PathBuf::from("/tmp/raw"));
        assert_eq!(config.expected_coverage_start.get(Observatory::Apo), 60_000);
        assert_eq!(
            config.platelist_dir,
            AlmanacConfig::default().platelist_dir
        );
    }

    #[test]
    fn test_night_dir() {
        let config = AlmanacConfig::default();
        assert_eq!(
            config.night_dir(Observatory::Lco, 59_600),
            Utf8PathBuf::from("/data/spectro/raw/lco/59600")
        );
    }
}
