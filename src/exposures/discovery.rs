//! # On-disk exposure discovery
//!
//! One exposure is written as up to three files, one per detector chip, named
//! `<prefix>-<chip>-<number>.apz` under `<data_dir>/<observatory>/<mjd>/`.
//! Discovery collapses that redundancy into **one record per exposure number**
//! with a chip-presence vector, reading the header of the first chip found.
//!
//! A missing night directory is an empty night, not an error. An exposure whose
//! header cannot be read is dropped from the listing with a warning; if the
//! operations database expected it, reconciliation will synthesize a placeholder
//! in its stead.

use camino::Utf8PathBuf;
use std::collections::BTreeMap;

use crate::almanac_errors::AlmanacError;
use crate::config::AlmanacConfig;
use crate::constants::{Chip, ExposureNumber, Mjd, Observatory, CHIP_COUNT};
use crate::exposures::exposure::Exposure;
use crate::exposures::headers::read_exposure_headers;

/// Path of one chip's raw file for an absolute exposure number.
pub fn raw_exposure_path(
    config: &AlmanacConfig,
    observatory: Observatory,
    mjd: Mjd,
    exposure: ExposureNumber,
    chip: Chip,
) -> Utf8PathBuf {
    config.night_dir(observatory, mjd).join(format!(
        "{}-{}-{:08}.apz",
        observatory.raw_prefix(),
        chip.letter(),
        exposure
    ))
}

/// Split a raw basename into `(prefix, chip, absolute exposure number)`.
///
/// Non-matching names (calibration products, temporary files) return `None` and
/// are skipped by discovery.
pub(crate) fn parse_raw_basename(basename: &str) -> Option<(&str, Chip, ExposureNumber)> {
    let stem = basename.strip_suffix(".apz")?;
    let mut parts = stem.split('-');
    let prefix = parts.next()?;
    let chip_part = parts.next()?;
    let number_part = parts.next()?;
    if parts.next().is_some() || chip_part.len() != 1 {
        return None;
    }
    let chip = Chip::from_letter(chip_part.chars().next()?)?;
    let exposure = number_part.parse().ok()?;
    Some((prefix, chip, exposure))
}

/// List the exposures a site recorded on one night.
///
/// Arguments
/// -----------------
/// * `config`: filesystem roots.
/// * `observatory`, `mjd`: the night key.
///
/// Return
/// ----------
/// * Exposure records ascending by exposure number, one per distinct number,
///   chips collapsed into presence flags. Empty when the night directory does
///   not exist.
pub fn list_night_exposures(
    config: &AlmanacConfig,
    observatory: Observatory,
    mjd: Mjd,
) -> Result<Vec<Exposure>, AlmanacError> {
    let night_dir = config.night_dir(observatory, mjd);
    if !night_dir.as_std_path().is_dir() {
        return Ok(Vec::new());
    }

    // BTreeMap so the listing comes out ascending without a second sort.
    let mut chip_presence: BTreeMap<ExposureNumber, [bool; CHIP_COUNT]> = BTreeMap::new();
    for entry in night_dir.as_std_path().read_dir()? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(basename) = file_name.to_str() else {
            continue;
        };
        let Some((prefix, chip, exposure)) = parse_raw_basename(basename) else {
            continue;
        };
        if prefix != observatory.raw_prefix() {
            continue;
        }
        chip_presence.entry(exposure).or_default()[chip.index()] = true;
    }

    let mut exposures = Vec::with_capacity(chip_presence.len());
    for (exposure, chips) in chip_presence {
        let read_chip = Chip::ALL[chips.iter().position(|&p| p).expect("at least one chip")];
        let path = raw_exposure_path(config, observatory, mjd, exposure, read_chip);
        match read_exposure_headers(&path) {
            Ok(headers) => exposures.push(Exposure::from_header_map(
                observatory,
                mjd,
                exposure,
                chips,
                read_chip,
                &headers,
            )),
            Err(e) => {
                log::warn!("{observatory}/{mjd}: dropping exposure {exposure}, unreadable header ({path}): {e}");
            }
        }
    }
    Ok(exposures)
}

/// Read one exposure's headers by identity, trying chips in readout order.
pub fn read_exposure(
    config: &AlmanacConfig,
    observatory: Observatory,
    mjd: Mjd,
    exposure: ExposureNumber,
) -> Result<Exposure, AlmanacError> {
    let mut chips = [false; CHIP_COUNT];
    for chip in Chip::ALL {
        let path = raw_exposure_path(config, observatory, mjd, exposure, chip);
        chips[chip.index()] = path.as_std_path().is_file();
    }
    for chip in Chip::ALL {
        if !chips[chip.index()] {
            continue;
        }
        let path = raw_exposure_path(config, observatory, mjd, exposure, chip);
        let headers = read_exposure_headers(&path)?;
        return Ok(Exposure::from_header_map(
            observatory, mjd, exposure, chips, chip, &headers,
        ));
    }
    Err(AlmanacError::ExposureFileNotFound {
        observatory: observatory.to_string(),
        mjd,
        exposure,
    })
}

#[cfg(test)]
mod discovery_test {
    use super::*;
    use crate::constants::night_prefix;
    use camino::Utf8Path;

    const CARD_BYTES: usize = 80;

    fn write_raw_file(dir: &Utf8Path, basename: &str, cards: &[&str]) {
        let mut contents = Vec::new();
        for card in cards {
            let mut bytes = card.as_bytes().to_vec();
            bytes.resize(CARD_BYTES, b' ');
            contents.extend_from_slice(&bytes);
        }
        let mut end = b"END".to_vec();
        end.resize(CARD_BYTES, b' ');
        contents.extend_from_slice(&end);
        std::fs::write(dir.join(basename).as_std_path(), &contents).unwrap();
    }

    fn test_config(root: &Utf8Path) -> AlmanacConfig {
        AlmanacConfig {
            data_dir: root.to_path_buf(),
            ..AlmanacConfig::default()
        }
    }

    #[test]
    fn test_parse_raw_basename() {
        assert_eq!(
            parse_raw_basename("apR-a-40760003.apz"),
            Some(("apR", Chip::A, 40_760_003))
        );
        assert_eq!(parse_raw_basename("apR-a-40760003.fits"), None);
        assert_eq!(parse_raw_basename("apR-ab-40760003.apz"), None);
        // Foreign prefixes parse; the lister filters them by site prefix.
        assert_eq!(
            parse_raw_basename("apFlux-a-40760003.apz"),
            Some(("apFlux", Chip::A, 40_760_003))
        );
    }

    #[test]
    fn test_missing_night_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let config = test_config(root);
        let exposures = list_night_exposures(&config, Observatory::Apo, 59_600).unwrap();
        assert!(exposures.is_empty());
    }

    #[test]
    fn test_chips_collapse_to_one_record() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let config = test_config(root);

        let mjd = 59_600;
        let night_dir = config.night_dir(Observatory::Apo, mjd);
        std::fs::create_dir_all(night_dir.as_std_path()).unwrap();

        let n1 = night_prefix(mjd) + 1;
        let n2 = night_prefix(mjd) + 2;
        for chip in ["a", "b", "c"] {
            write_raw_file(
                &night_dir,
                &format!("apR-{chip}-{n1:08}.apz"),
                &["IMAGETYP= 'Object  '", "FIELDID =  101"],
            );
        }
        // Second exposure only has chip b on disk.
        write_raw_file(
            &night_dir,
            &format!("apR-b-{n2:08}.apz"),
            &["IMAGETYP= 'ArcLamp '"],
        );
        // A stray non-raw file is ignored.
        std::fs::write(night_dir.join("notes.txt").as_std_path(), b"x").unwrap();

        let exposures = list_night_exposures(&config, Observatory::Apo, mjd).unwrap();
        assert_eq!(exposures.len(), 2);

        assert_eq!(exposures[0].exposure, n1);
        assert_eq!(exposures[0].chips, [true, true, true]);
        assert_eq!(exposures[0].read_chip, Some(Chip::A));
        assert_eq!(exposures[0].field_id, 101);

        assert_eq!(exposures[1].exposure, n2);
        assert_eq!(exposures[1].chips, [false, true, false]);
        assert_eq!(exposures[1].read_chip, Some(Chip::B));
    }

    #[test]
    fn test_read_exposure_by_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let config = test_config(root);

        let mjd = 59_600;
        let night_dir = config.night_dir(Observatory::Apo, mjd);
        std::fs::create_dir_all(night_dir.as_std_path()).unwrap();

        let number = night_prefix(mjd) + 5;
        for chip in ["b", "c"] {
            write_raw_file(
                &night_dir,
                &format!("apR-{chip}-{number:08}.apz"),
                &["IMAGETYP= 'DomeFlat'"],
            );
        }

        let exposure = read_exposure(&config, Observatory::Apo, mjd, number).unwrap();
        assert_eq!(exposure.chips, [false, true, true]);
        assert_eq!(exposure.read_chip, Some(Chip::B));

        let missing = read_exposure(&config, Observatory::Apo, mjd, number + 1);
        assert!(matches!(
            missing,
            Err(crate::almanac_errors::AlmanacError::ExposureFileNotFound { .. })
        ));
    }
}
