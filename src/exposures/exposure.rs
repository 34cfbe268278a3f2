//! # The exposure record
//!
//! [`Exposure`] represents one shutter event, uniquely identified by
//! `(observatory, mjd, exposure)` and immutable after construction. Records are
//! built from one of three places (an on-disk header read, an expected-exposure
//! record from the operations database, or a synthesized placeholder filling a
//! numbering gap) and all three paths produce the **same record shape**, so a
//! reconciled timeline is uniform across real and placeholder rows.
//!
//! All header coercions happen here, once, at construction: strings to booleans
//! via the `T`/`F` convention, strings to floats with a NaN fallback, strings to
//! integers with sentinel fallbacks. A corrupt field never aborts the night; it
//! is logged at debug and replaced by its sentinel.

use hifitime::Epoch;
use serde::Serialize;
use std::str::FromStr;

use crate::constants::{
    night_prefix, Chip, ExposureNumber, Mjd, Observatory, CHIP_COUNT, ID_ABSENT, ID_UNPARSABLE,
};
use crate::exposures::headers::HeaderMap;

/// Classification of one shutter event, from the `IMAGETYP` header card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImageType {
    Object,
    Dark,
    ArcLamp,
    DomeFlat,
    InternalFlat,
    QuartzFlat,
    TwilightFlat,
    Blackbody,
    /// Placeholder for a numbering gap: no file was found on disk.
    Missing,
}

impl ImageType {
    /// Parse a header value, case-insensitively. Anything unrecognized is
    /// treated as [`ImageType::Missing`].
    pub fn parse(value: &str) -> ImageType {
        match value.trim().to_ascii_lowercase().as_str() {
            "object" => ImageType::Object,
            "dark" => ImageType::Dark,
            "arclamp" => ImageType::ArcLamp,
            "domeflat" => ImageType::DomeFlat,
            "internalflat" => ImageType::InternalFlat,
            "quartzflat" => ImageType::QuartzFlat,
            "twilightflat" => ImageType::TwilightFlat,
            "blackbody" => ImageType::Blackbody,
            _ => ImageType::Missing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Object => "Object",
            ImageType::Dark => "Dark",
            ImageType::ArcLamp => "ArcLamp",
            ImageType::DomeFlat => "DomeFlat",
            ImageType::InternalFlat => "InternalFlat",
            ImageType::QuartzFlat => "QuartzFlat",
            ImageType::TwilightFlat => "TwilightFlat",
            ImageType::Blackbody => "Blackbody",
            ImageType::Missing => "Missing",
        }
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One shutter event.
///
/// Fields are coerced at construction and never re-parsed downstream. Identifier
/// fields use [`ID_ABSENT`] when the header card was missing and
/// [`ID_UNPARSABLE`] when it was present but did not parse; instrument-state
/// floats fall back to NaN; lamp flags default to off.
#[derive(Debug, Clone, Serialize)]
pub struct Exposure {
    pub observatory: Observatory,
    pub mjd: Mjd,
    /// Absolute exposure number (night prefix + per-night counter).
    pub exposure: ExposureNumber,

    pub image_type: ImageType,
    /// Plugged-plate name from the header (`<plate>-<mjd>-<iteration>`), or `""`.
    pub name: String,
    pub n_read: i64,
    /// Raw `DATE-OBS` string; parse on demand with [`Exposure::date_obs_epoch`].
    pub date_obs: String,
    pub observer_comment: String,

    pub field_id: i64,
    pub design_id: i64,
    pub config_id: i64,
    pub plate_id: i64,
    pub map_id: i64,
    pub cart_id: i64,

    pub seeing: f64,
    pub focus: f64,
    pub collpist: f64,
    pub colpitch: f64,
    pub dithpix: f64,

    pub lamp_quartz: bool,
    pub lamp_thar: bool,
    pub lamp_une: bool,

    /// Per-chip raw-file presence flags.
    pub chips: [bool; CHIP_COUNT],
    /// Which chip's header was actually read, when any was.
    pub read_chip: Option<Chip>,
}

impl Exposure {
    /// Placeholder template for a numbering gap: `Missing` image type, all
    /// identifiers absent, all instrument state NaN, no chips on disk.
    pub fn missing(observatory: Observatory, mjd: Mjd, exposure: ExposureNumber) -> Exposure {
        Exposure {
            observatory,
            mjd,
            exposure,
            image_type: ImageType::Missing,
            name: String::new(),
            n_read: 0,
            date_obs: String::new(),
            observer_comment: String::new(),
            field_id: ID_ABSENT,
            design_id: ID_ABSENT,
            config_id: ID_ABSENT,
            plate_id: ID_ABSENT,
            map_id: ID_ABSENT,
            cart_id: ID_ABSENT,
            seeing: f64::NAN,
            focus: f64::NAN,
            collpist: f64::NAN,
            colpitch: f64::NAN,
            dithpix: f64::NAN,
            lamp_quartz: false,
            lamp_thar: false,
            lamp_une: false,
            chips: [false; CHIP_COUNT],
            read_chip: None,
        }
    }

    /// Build a record from a raw header map plus identifying keys.
    ///
    /// Arguments
    /// -----------------
    /// * `observatory`, `mjd`, `exposure`: record identity.
    /// * `chips`: per-chip file presence, from discovery.
    /// * `read_chip`: the chip whose header supplied `headers`.
    /// * `headers`: upper-case key to trimmed raw value, from
    ///   [`read_exposure_headers`](crate::exposures::headers::read_exposure_headers).
    ///
    /// Return
    /// ----------
    /// * A fully coerced [`Exposure`]; malformed values land on their sentinels.
    pub fn from_header_map(
        observatory: Observatory,
        mjd: Mjd,
        exposure: ExposureNumber,
        chips: [bool; CHIP_COUNT],
        read_chip: Chip,
        headers: &HeaderMap,
    ) -> Exposure {
        let get = |key: &str| headers.get(key).map(String::as_str);
        Exposure {
            observatory,
            mjd,
            exposure,
            image_type: get("IMAGETYP").map(ImageType::parse).unwrap_or(ImageType::Missing),
            name: get("NAME").unwrap_or_default().to_string(),
            n_read: coerce_int(get("NREAD"), 0, 0).max(0),
            date_obs: get("DATE-OBS").unwrap_or_default().to_string(),
            observer_comment: get("OBSCMNT").unwrap_or_default().to_string(),
            field_id: coerce_id(get("FIELDID")),
            design_id: coerce_id(get("DESIGNID")),
            config_id: coerce_id(get("CONFIGID")),
            plate_id: coerce_id(get("PLATEID")),
            map_id: coerce_id(get("MAPID")),
            cart_id: coerce_cart_id(get("CARTID")),
            seeing: coerce_float(get("SEEING")),
            focus: coerce_float(get("FOCUS")),
            collpist: coerce_float(get("COLLPIST")),
            colpitch: coerce_float(get("COLPITCH")),
            dithpix: coerce_float(get("DITHPIX")),
            lamp_quartz: coerce_bool(get("LAMPQRTZ")),
            lamp_thar: coerce_bool(get("LAMPTHAR")),
            lamp_une: coerce_bool(get("LAMPUNE")),
            chips,
            read_chip: Some(read_chip),
        }
    }

    /// Whether this exposure belongs to the robotic fiber-positioner era.
    pub fn fps(&self) -> bool {
        self.mjd >= self.observatory.fps_era_start()
    }

    /// Zero-padded path component encoding the absolute exposure number.
    pub fn exposure_string(&self) -> String {
        format!("{:08}", self.exposure)
    }

    /// Per-night counter of this exposure (suffix of the absolute number).
    pub fn exposure_in_night(&self) -> i64 {
        self.exposure - night_prefix(self.mjd)
    }

    /// Whether any chip of this exposure produced a file on disk.
    ///
    /// Synthesized placeholders never do; this is what keeps them out of
    /// sequences when path existence is required.
    pub fn path_exists(&self) -> bool {
        self.chips.iter().any(|&present| present)
    }

    /// Bit mask of chip presence (chip A in the lowest bit).
    pub fn chip_flags(&self) -> u8 {
        self.chips
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &present)| acc | ((present as u8) << i))
    }

    /// MJD on which the plate for this exposure was plugged, from the header
    /// `name` (`<plate>-<mjd>-<iteration>`); -1 when the name does not carry one.
    pub fn plugged_mjd(&self) -> Mjd {
        self.name
            .split('-')
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(ID_ABSENT)
    }

    /// Plugging iteration tag from the header `name`, or `""`.
    pub fn plugged_iteration(&self) -> &str {
        self.name.split('-').nth(2).unwrap_or("")
    }

    /// Parse `DATE-OBS` into an [`Epoch`], when present and well formed.
    pub fn date_obs_epoch(&self) -> Option<Epoch> {
        Epoch::from_str(self.date_obs.trim()).ok()
    }

    /// Grouping key for science sequence detection.
    pub fn science_key(&self) -> (i64, i64, i64, ImageType) {
        (self.field_id, self.plate_id, self.config_id, self.image_type)
    }

    /// Grouping key for calibration (arc-lamp) sequence detection.
    ///
    /// Bit-pattern equality, so exposures with an unparsable dither position
    /// (NaN) group together instead of each starting its own sequence.
    pub fn dither_key(&self) -> u64 {
        self.dithpix.to_bits()
    }
}

// -------------------------------------------------------------------------------------------------
// Header coercions
// -------------------------------------------------------------------------------------------------

/// Identifier coercion: absent → [`ID_ABSENT`], empty → [`ID_UNPARSABLE`],
/// unparsable → [`ID_UNPARSABLE`].
fn coerce_id(value: Option<&str>) -> i64 {
    coerce_int(value, ID_ABSENT, ID_UNPARSABLE)
}

fn coerce_int(value: Option<&str>, absent: i64, unparsable: i64) -> i64 {
    match value {
        None => absent,
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return unparsable;
            }
            trimmed.parse().unwrap_or_else(|_| {
                log::debug!("unparsable integer header value {raw:?}");
                unparsable
            })
        }
    }
}

/// Cart identifier: the FPS era writes the literal `FPS` instead of a number.
fn coerce_cart_id(value: Option<&str>) -> i64 {
    match value {
        Some(raw) if raw.trim().eq_ignore_ascii_case("fps") => 0,
        other => coerce_id(other),
    }
}

fn coerce_float(value: Option<&str>) -> f64 {
    match value {
        None => f64::NAN,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::debug!("unparsable float header value {raw:?}");
            f64::NAN
        }),
    }
}

/// Lamp-state coercion: `T` → on, `F` → off, anything else → off.
fn coerce_bool(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("T") | Some("t"))
}

#[cfg(test)]
mod exposure_test {
    use super::*;
    use crate::exposures::headers::HeaderMap;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn build(headers: &HeaderMap) -> Exposure {
        Exposure::from_header_map(
            Observatory::Apo,
            59_600,
            night_prefix(59_600) + 12,
            [true, true, false],
            Chip::A,
            headers,
        )
    }

    #[test]
    fn test_coercions_land_on_sentinels() {
        let exposure = build(&header_map(&[
            ("IMAGETYP", "Object"),
            ("FIELDID", "101"),
            ("PLATEID", ""),
            ("CONFIGID", "not-a-number"),
            ("CARTID", "FPS"),
            ("SEEING", "bogus"),
            ("DITHPIX", "12.994"),
            ("LAMPQRTZ", "T"),
            ("LAMPTHAR", "F"),
            ("NREAD", "47"),
        ]));

        assert_eq!(exposure.image_type, ImageType::Object);
        assert_eq!(exposure.field_id, 101);
        assert_eq!(exposure.plate_id, ID_UNPARSABLE);
        assert_eq!(exposure.config_id, ID_UNPARSABLE);
        assert_eq!(exposure.design_id, ID_ABSENT);
        assert_eq!(exposure.cart_id, 0);
        assert!(exposure.seeing.is_nan());
        assert_eq!(exposure.dithpix, 12.994);
        assert!(exposure.lamp_quartz);
        assert!(!exposure.lamp_thar);
        assert!(!exposure.lamp_une);
        assert_eq!(exposure.n_read, 47);
    }

    #[test]
    fn test_chip_bookkeeping() {
        let exposure = build(&header_map(&[("IMAGETYP", "Dark")]));
        assert!(exposure.path_exists());
        assert_eq!(exposure.chip_flags(), 0b011);
        assert_eq!(exposure.read_chip, Some(Chip::A));

        let gap = Exposure::missing(Observatory::Apo, 59_600, 1);
        assert!(!gap.path_exists());
        assert_eq!(gap.chip_flags(), 0);
    }

    #[test]
    fn test_exposure_string_and_in_night_counter() {
        let exposure = build(&header_map(&[]));
        assert_eq!(exposure.exposure_in_night(), 12);
        assert_eq!(exposure.exposure_string(), format!("{:08}", exposure.exposure));
    }

    #[test]
    fn test_plugged_name_parsing() {
        let mut exposure = build(&header_map(&[("NAME", "8297-57131-01")]));
        assert_eq!(exposure.plugged_mjd(), 57_131);
        assert_eq!(exposure.plugged_iteration(), "01");

        exposure.name = "FPS field".to_string();
        assert_eq!(exposure.plugged_mjd(), ID_ABSENT);
        assert_eq!(exposure.plugged_iteration(), "");
    }

    #[test]
    fn test_fps_era_threshold() {
        let mut exposure = build(&header_map(&[]));
        assert!(exposure.fps());
        exposure.mjd = 59_549;
        assert!(!exposure.fps());
    }

    #[test]
    fn test_image_type_parse_is_case_insensitive() {
        assert_eq!(ImageType::parse("ARCLAMP"), ImageType::ArcLamp);
        assert_eq!(ImageType::parse("object"), ImageType::Object);
        assert_eq!(ImageType::parse("QuartzFlat"), ImageType::QuartzFlat);
        assert_eq!(ImageType::parse("???"), ImageType::Missing);
    }
}
