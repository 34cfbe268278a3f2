//! # Exposure timeline reconciliation
//!
//! Merges two sources of truth about one (observatory, night) pair into a
//! single **gap-free, ascending** timeline: the raw files actually found on
//! disk, and the exposures an authoritative operations database says were taken.
//! Every numbering gap is filled with a synthesized placeholder record, and every
//! placeholder gets a diagnostic message whose tone depends on provenance:
//!
//! * the database has a record but the file is gone → something is wrong on disk;
//! * no record and the night is inside database coverage → something is wrong in
//!   the database (or nothing was ever taken and the numbering jumped);
//! * no record and the night predates database coverage → unremarkable.
//!
//! The reconciler is pure: it owns its inputs, performs no I/O, and is invariant
//! to the pre-sort order of the on-disk listing, which makes it safe to drive
//! from per-night workers without shared state.

use std::collections::BTreeMap;

use crate::constants::{night_prefix, ExposureNumber, Mjd, Observatory};
use crate::exposures::exposure::Exposure;

use crate::almanac_errors::AlmanacError;

/// One expected-exposure record from the operations database.
///
/// Only the fields the database reliably carries; everything else in a
/// synthesized placeholder keeps the missing-template sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedExposure {
    /// Exposure flavor the database recorded (free text, e.g. `Object`).
    pub flavor: String,
    pub field_id: Option<i64>,
    pub design_id: Option<i64>,
    pub config_id: Option<i64>,
    pub plate_id: Option<i64>,
    pub date_obs: Option<String>,
}

/// Authoritative source of expected exposures for a night.
///
/// Returns an **empty map** when the night predates the source's coverage; a
/// hard failure (connectivity, schema) is an error the caller may absorb
/// per night.
pub trait ExpectedSource {
    fn expected_exposures(
        &self,
        observatory: Observatory,
        mjd: Mjd,
    ) -> Result<BTreeMap<ExposureNumber, ExpectedExposure>, AlmanacError>;
}

/// Source used when no operations database is reachable: expects nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExpectedSource;

impl ExpectedSource for NoExpectedSource {
    fn expected_exposures(
        &self,
        _observatory: Observatory,
        _mjd: Mjd,
    ) -> Result<BTreeMap<ExposureNumber, ExpectedExposure>, AlmanacError> {
        Ok(BTreeMap::new())
    }
}

/// Reconciliation policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Force the timeline to start at the night's baseline number, so exposures
    /// between the baseline and the first file on disk are also flagged missing.
    pub require_start_at_baseline: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            require_start_at_baseline: true,
        }
    }
}

/// One night's reconciled timeline plus its diagnostics.
#[derive(Debug, Clone)]
pub struct ReconciledNight {
    pub observatory: Observatory,
    pub mjd: Mjd,
    /// Gap-free, ascending by exposure number.
    pub exposures: Vec<Exposure>,
    /// One human-readable message per synthesized placeholder.
    pub messages: Vec<String>,
}

/// Merge the on-disk listing with the expected-exposure map into one timeline.
///
/// Arguments
/// -----------------
/// * `observatory`, `mjd`: the night key.
/// * `on_disk`: discovery output, in any order, possibly empty.
/// * `expected`: expected-exposure records keyed by absolute exposure number,
///   possibly empty (e.g. nights before database coverage).
/// * `coverage_start`: first night the database is trusted to cover; decides the
///   tone of "no record" messages.
/// * `options`: see [`ReconcileOptions`].
///
/// Return
/// ----------
/// * A [`ReconciledNight`] whose exposure numbers are contiguous and ascending.
///   Empty inputs yield an empty timeline, never an error.
pub fn reconcile_night(
    observatory: Observatory,
    mjd: Mjd,
    mut on_disk: Vec<Exposure>,
    mut expected: BTreeMap<ExposureNumber, ExpectedExposure>,
    coverage_start: Mjd,
    options: &ReconcileOptions,
) -> ReconciledNight {
    on_disk.sort_by_key(|e| e.exposure);

    let mut night = ReconciledNight {
        observatory,
        mjd,
        exposures: Vec::with_capacity(on_disk.len() + expected.len()),
        messages: Vec::new(),
    };

    // Running cursor: the last exposure number accounted for. With the baseline
    // forced, leading gaps before the first file on disk are flagged too.
    let mut last_seen = match (&on_disk[..], options.require_start_at_baseline) {
        (_, true) => night_prefix(mjd),
        ([first, ..], false) => first.exposure - 1,
        // Nothing on disk and no forced baseline: start just before the first
        // expected record so expected-only nights reconcile without a leading run.
        ([], false) => match expected.keys().next() {
            Some(&first) => first - 1,
            None => night_prefix(mjd),
        },
    };

    for real in on_disk {
        // An exposure numbered at or below the cursor cannot open a gap;
        // append it without rewinding.
        if real.exposure > last_seen {
            for gap in (last_seen + 1)..real.exposure {
                synthesize(&mut night, gap, &mut expected, coverage_start);
            }
            last_seen = real.exposure;
        }
        // The database record for a file we do have is accounted for.
        expected.remove(&real.exposure);
        night.exposures.push(real);
    }

    // Records the database expected but nothing on disk ever reached, ascending;
    // covers nights with zero files. Gaps between them are flagged as well.
    while let Some(&next) = expected.keys().next() {
        if next <= last_seen {
            expected.remove(&next);
            continue;
        }
        // When nothing was on disk the cursor may still sit at the baseline;
        // without the forced baseline it was seeded just before `next`.
        for gap in (last_seen + 1)..=next {
            synthesize(&mut night, gap, &mut expected, coverage_start);
        }
        last_seen = next;
    }

    // Synthesis order is ascending by construction, but expected keys that were
    // interleaved with the on-disk walk make that worth not trusting.
    night.exposures.sort_by_key(|e| e.exposure);

    night
}

/// Fill one numbering gap with a placeholder, choosing the message tone from the
/// expected map and the coverage cutoff. Consumes the matched expected key.
fn synthesize(
    night: &mut ReconciledNight,
    exposure: ExposureNumber,
    expected: &mut BTreeMap<ExposureNumber, ExpectedExposure>,
    coverage_start: Mjd,
) {
    let mut placeholder = Exposure::missing(night.observatory, night.mjd, exposure);
    let message = match expected.remove(&exposure) {
        Some(record) => {
            // Merge the database record over the missing template: identifiers
            // and timing come from the record, the image type stays Missing
            // because no file backs this row; the recorded flavor goes into the
            // diagnostic instead.
            if let Some(field_id) = record.field_id {
                placeholder.field_id = field_id;
            }
            if let Some(design_id) = record.design_id {
                placeholder.design_id = design_id;
            }
            if let Some(config_id) = record.config_id {
                placeholder.config_id = config_id;
            }
            if let Some(plate_id) = record.plate_id {
                placeholder.plate_id = plate_id;
            }
            if let Some(date_obs) = record.date_obs {
                placeholder.date_obs = date_obs;
            }
            let flavor = if record.flavor.is_empty() {
                "unknown flavor".to_string()
            } else {
                record.flavor
            };
            format!(
                "{}/{} exposure {}: operations database has a record ({}) but no file was found on disk",
                night.observatory, night.mjd, exposure, flavor
            )
        }
        None if night.mjd >= coverage_start => format!(
            "{}/{} exposure {}: no file on disk and no operations database record, \
             although the night is within database coverage",
            night.observatory, night.mjd, exposure
        ),
        None => format!(
            "{}/{} exposure {}: no file on disk; night predates operations database \
             coverage, so no record was expected",
            night.observatory, night.mjd, exposure
        ),
    };
    log::debug!("{message}");
    night.messages.push(message);
    night.exposures.push(placeholder);
}
