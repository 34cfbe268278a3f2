//! # Per-sequence target attachment
//!
//! Every exposure in a science sequence shares one plate/configuration, so the
//! fiber map is fetched **once per sequence** (through its first exposure) and
//! shared by the whole sequence. Master-identifier resolution is batched the
//! same way: one query per identifier kind over the union of identifiers seen in
//! the whole timeline, never one query per target.
//!
//! Resolution failure is never fatal here: an offline backend leaves every
//! target on the sentinel id. The only error that propagates is an ambiguous
//! planned-to-plugged spatial match, which indicates corrupt source data.

use ahash::AHashMap;
use std::collections::BTreeSet;

use crate::almanac_errors::AlmanacError;
use crate::constants::SDSS_ID_UNRESOLVED;
use crate::exposures::exposure::Exposure;
use crate::exposures::sequence::Sequence;
use crate::identifiers::{
    resolve_all, IdentifierKind, IdentifierLookup, IdentifierResolver,
};
use crate::targets::fps::FpsTarget;
use crate::targets::plate::{match_planned_to_plugged, PlateTarget};
use crate::targets::source::TargetSource;
use crate::targets::TargetIdentity;

/// Fiber maps for one night, keyed by configuration id (FPS era) and plate id
/// (plate era). All exposures of a sequence share the entry their representative
/// fetched.
#[derive(Debug, Default)]
pub struct FiberMaps {
    pub fps: AHashMap<i64, Vec<FpsTarget>>,
    pub plates: AHashMap<i64, Vec<PlateTarget>>,
}

impl FiberMaps {
    pub fn is_empty(&self) -> bool {
        self.fps.is_empty() && self.plates.is_empty()
    }

    /// Number of targets across both eras.
    pub fn target_count(&self) -> usize {
        self.fps.values().map(Vec::len).sum::<usize>()
            + self.plates.values().map(Vec::len).sum::<usize>()
    }
}

/// Attachment policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentOptions {
    /// Attempt remote master-identifier resolution. When false (or when the
    /// resolver is offline) every target keeps the sentinel id.
    pub resolve_ids: bool,
}

impl Default for AttachmentOptions {
    fn default() -> Self {
        AttachmentOptions { resolve_ids: true }
    }
}

/// Fetch fiber maps for the science sequences of one timeline and back-fill
/// resolved master identifiers.
///
/// Arguments
/// -----------------
/// * `exposures`: the reconciled timeline, ascending by exposure number.
/// * `science_sequences`: output of science sequence detection on `exposures`.
/// * `source`: fiber-map file boundary.
/// * `resolver`: master-identifier backend (possibly offline).
/// * `options`: see [`AttachmentOptions`].
///
/// Return
/// ----------
/// * The night's [`FiberMaps`] with every target's `sdss_id` either resolved or
///   left on the sentinel. Fetch failures for one configuration/plate degrade to
///   an empty list with a warning; only
///   [`AlmanacError::AmbiguousPlugMatch`] propagates.
pub fn attach_targets(
    exposures: &[Exposure],
    science_sequences: &[Sequence],
    source: &dyn TargetSource,
    resolver: &dyn IdentifierResolver,
    options: &AttachmentOptions,
) -> Result<FiberMaps, AlmanacError> {
    let mut maps = FiberMaps::default();

    for &(start, _end) in science_sequences {
        let Some(representative) = exposure_by_number(exposures, start) else {
            // Sequences were detected on this timeline, so this is a caller
            // mix-up; skip rather than guess.
            log::warn!("no exposure {start} in timeline while attaching targets");
            continue;
        };

        if representative.fps() {
            let config_id = representative.config_id;
            if config_id <= 0 || maps.fps.contains_key(&config_id) {
                continue;
            }
            let targets = match source.fps_targets(representative.observatory, config_id) {
                Ok(targets) => targets,
                Err(e) => {
                    log::warn!(
                        "{}/{}: no fps targets for config {config_id}: {e}",
                        representative.observatory,
                        representative.mjd
                    );
                    Vec::new()
                }
            };
            maps.fps.insert(config_id, targets);
        } else {
            let plate_id = representative.plate_id;
            if plate_id <= 0 || maps.plates.contains_key(&plate_id) {
                continue;
            }
            let targets = fetch_plate_targets(source, representative, plate_id)?;
            maps.plates.insert(plate_id, targets);
        }
    }

    let lookups = if options.resolve_ids {
        resolve_identifiers(&maps, resolver)?
    } else {
        AHashMap::new()
    };
    back_fill(&mut maps, &lookups);

    Ok(maps)
}

/// Locate an exposure by absolute number in an ascending timeline.
fn exposure_by_number(exposures: &[Exposure], number: i64) -> Option<&Exposure> {
    exposures
        .binary_search_by_key(&number, |e| e.exposure)
        .ok()
        .map(|i| &exposures[i])
}

/// Planned/plugged fetch and spatial match for one plate. File unavailability
/// degrades to an empty list; an ambiguous match propagates.
fn fetch_plate_targets(
    source: &dyn TargetSource,
    representative: &Exposure,
    plate_id: i64,
) -> Result<Vec<PlateTarget>, AlmanacError> {
    let plugged_mjd = representative.plugged_mjd();
    let iteration = representative.plugged_iteration();

    let planned = match source.planned_holes(plate_id) {
        Ok(holes) => holes,
        Err(e) => {
            log::warn!("plate {plate_id}: no drilling file: {e}");
            return Ok(Vec::new());
        }
    };
    let plugged = match source.plugged_holes(
        representative.observatory,
        plugged_mjd,
        plate_id,
        iteration,
    ) {
        Ok(holes) => holes,
        Err(e) => {
            log::warn!("plate {plate_id}: no plug map for MJD {plugged_mjd}: {e}");
            return Ok(Vec::new());
        }
    };

    match_planned_to_plugged(
        plate_id,
        representative.observatory,
        plugged_mjd,
        &planned,
        &plugged,
    )
}

/// One batched lookup per identifier kind over the distinct identifiers of the
/// whole timeline.
fn resolve_identifiers(
    maps: &FiberMaps,
    resolver: &dyn IdentifierResolver,
) -> Result<AHashMap<IdentifierKind, IdentifierLookup>, AlmanacError> {
    // BTreeSet per kind keeps batched queries deterministic.
    let mut pending: AHashMap<IdentifierKind, BTreeSet<String>> = AHashMap::new();
    let mut collect = |target: &dyn TargetIdentity| {
        if !target.expected_to_be_assigned_sdss_id() {
            return;
        }
        for (kind, id) in target.candidate_ids() {
            pending.entry(kind).or_default().insert(id);
        }
    };
    for targets in maps.fps.values() {
        targets.iter().for_each(|t| collect(t));
    }
    for targets in maps.plates.values() {
        targets.iter().for_each(|t| collect(t));
    }

    let mut lookups = AHashMap::with_capacity(pending.len());
    for (kind, ids) in pending {
        let ids: Vec<String> = ids.into_iter().collect();
        lookups.insert(kind, resolve_all(resolver, kind, &ids)?);
    }
    Ok(lookups)
}

/// Assign every target its resolved id, preferring the first hit in
/// [`IdentifierKind::PRIORITY`] order, or the sentinel when nothing matched.
fn back_fill(maps: &mut FiberMaps, lookups: &AHashMap<IdentifierKind, IdentifierLookup>) {
    let resolve_one = |target: &mut dyn TargetIdentity| {
        let candidates = target.candidate_ids();
        let resolved = IdentifierKind::PRIORITY
            .iter()
            .filter_map(|kind| {
                let (_, id) = candidates.iter().find(|(k, _)| k == kind)?;
                lookups.get(kind)?.get(id).copied()
            })
            .next()
            .unwrap_or(SDSS_ID_UNRESOLVED);
        target.set_sdss_id(resolved);
    };

    for targets in maps.fps.values_mut() {
        targets.iter_mut().for_each(|t| resolve_one(t));
    }
    for targets in maps.plates.values_mut() {
        targets.iter_mut().for_each(|t| resolve_one(t));
    }
}
