//! # Sequence detection
//!
//! A *sequence* is a maximal run of same-kind exposures that belong together
//! observationally: consecutive exposure numbers sharing an identical grouping
//! key. Two policies are applied to every reconciled timeline:
//!
//! * **science** sequences group object exposures on
//!   `(field_id, plate_id, config_id, image_type)`;
//! * **calibration** sequences group arc-lamp exposures on the dither pixel
//!   position alone.
//!
//! Both demand exposure-number contiguity, so a synthesized missing placeholder
//! severs an otherwise identical run. That is the point of reconciling gaps
//! before detecting sequences.

use itertools::Itertools;

use crate::constants::ExposureNumber;
use crate::exposures::exposure::{Exposure, ImageType};

/// Inclusive `(first, last)` pair of absolute exposure numbers.
pub type Sequence = (ExposureNumber, ExposureNumber);

/// Sequence detection policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct SequenceOptions {
    /// Split groups at every numbering gap. When false, a whole same-key group
    /// is one sequence regardless of gaps.
    pub require_contiguous: bool,
    /// Exclude records with no backing file (synthesized placeholders) from
    /// membership, even when they match the grouping key.
    pub require_path_exists: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        SequenceOptions {
            require_contiguous: true,
            require_path_exists: true,
        }
    }
}

/// Partition a timeline into inclusive exposure-number ranges.
///
/// Arguments
/// -----------------
/// * `exposures`: the night's timeline; sorted input is the caller contract,
///   but the filtered view is re-sorted defensively.
/// * `image_type`: record filter applied before grouping.
/// * `key`: grouping key; equality defines "same sequence".
/// * `options`: see [`SequenceOptions`].
///
/// Return
/// ----------
/// * Sequences in encounter order (ascending start number), never overlapping.
///   An empty filtered view yields an empty list.
pub fn detect_sequences<K: PartialEq>(
    exposures: &[Exposure],
    image_type: ImageType,
    key: impl Fn(&Exposure) -> K,
    options: &SequenceOptions,
) -> Vec<Sequence> {
    let mut filtered: Vec<&Exposure> = exposures
        .iter()
        .filter(|e| e.image_type == image_type)
        .filter(|e| !options.require_path_exists || e.path_exists())
        .collect();
    if filtered.is_empty() {
        return Vec::new();
    }
    filtered.sort_by_key(|e| e.exposure);

    let mut sequences = Vec::new();
    for (_, group) in &filtered.into_iter().chunk_by(|e| key(e)) {
        let numbers: Vec<ExposureNumber> = group.map(|e| e.exposure).collect();
        if options.require_contiguous {
            sequences.extend(contiguous_runs(&numbers));
        } else {
            // A group is never empty by construction of chunk_by.
            sequences.push((numbers[0], numbers[numbers.len() - 1]));
        }
    }
    sequences
}

/// Split an ascending number list into maximal gap-free runs.
fn contiguous_runs(numbers: &[ExposureNumber]) -> Vec<Sequence> {
    let mut runs = Vec::new();
    let mut iter = numbers.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };
    let (mut start, mut prev) = (first, first);
    for n in iter {
        if n - prev > 1 {
            runs.push((start, prev));
            start = n;
        }
        prev = n;
    }
    runs.push((start, prev));
    runs
}

/// Science sequences: object exposures grouped by field, plate, configuration,
/// and image type, with contiguity required.
pub fn science_sequences(exposures: &[Exposure], options: &SequenceOptions) -> Vec<Sequence> {
    detect_sequences(exposures, ImageType::Object, Exposure::science_key, options)
}

/// Calibration sequences: arc-lamp exposures grouped by dither pixel position,
/// with contiguity required.
pub fn arclamp_sequences(exposures: &[Exposure], options: &SequenceOptions) -> Vec<Sequence> {
    detect_sequences(exposures, ImageType::ArcLamp, Exposure::dither_key, options)
}
