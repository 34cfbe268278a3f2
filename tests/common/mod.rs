#![allow(dead_code)]

use almanac::constants::night_prefix;
use almanac::{Exposure, ImageType, Mjd, Observatory};

/// Night used by most synthetic timelines.
pub const MJD: Mjd = 59_600;

/// A plate-era night (before the positioner era).
pub const PLATE_MJD: Mjd = 57_131;

/// Baseline exposure number of [`MJD`].
pub fn base() -> i64 {
    night_prefix(MJD)
}

/// An on-disk exposure at `baseline + offset` with all three chips present.
pub fn on_disk(offset: i64, image_type: ImageType) -> Exposure {
    let mut e = Exposure::missing(Observatory::Apo, MJD, night_prefix(MJD) + offset);
    e.image_type = image_type;
    e.chips = [true, true, true];
    e
}

/// An object exposure with explicit grouping-key fields.
pub fn object(offset: i64, field_id: i64, config_id: i64) -> Exposure {
    let mut e = on_disk(offset, ImageType::Object);
    e.field_id = field_id;
    e.config_id = config_id;
    e
}

/// An arc-lamp exposure at a given dither position.
pub fn arclamp(offset: i64, dithpix: f64) -> Exposure {
    let mut e = on_disk(offset, ImageType::ArcLamp);
    e.dithpix = dithpix;
    e
}
