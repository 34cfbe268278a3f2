//! # Plate-era targets and the planned-to-plugged spatial match
//!
//! In the drilled-plate era the instrument records which holes were *plugged*
//! (the plug map, measured at the plugging station) separately from which holes
//! were *planned* (the drilling file, which carries the targeting metadata).
//! A [`PlateTarget`] is the pairing of one plugged hole with its planned hole,
//! recovered by a nearest-neighbor coordinate match within a small tolerance.
//!
//! The match is deliberately unforgiving: a plugged hole that falls within
//! tolerance of **more than one** planned hole indicates corrupt source files,
//! and guessing would silently misassociate fibers with targets. That condition
//! is the one hard error in target attachment.

use serde::Serialize;
use smallvec::smallvec;

use crate::almanac_errors::AlmanacError;
use crate::constants::{
    Mjd, Observatory, APO_MISWIRED_PLUG_MJD_RANGES, PLATE_FIBER_ID_MAX, PLUG_MATCH_TOLERANCE,
    SDSS_ID_UNRESOLVED,
};
use crate::identifiers::{parse_input_id, IdentifierKind};
use crate::targets::{CandidateIds, TargetIdentity};

/// Hole types drilled for this spectrograph; other holes belong to the other
/// instruments sharing the plate.
pub const SPECTROGRAPH_HOLE_TYPES: [&str; 3] = ["APOGEE", "APOGEE_SHARED", "APOGEE_SOUTH"];

/// Plug maps record holes for both spectrographs on the cartridge; this one is
/// spectrograph 2.
pub const SPECTROGRAPH_ID: i64 = 2;

/// One hole from the measured plug map.
#[derive(Debug, Clone, Serialize)]
pub struct PluggedHole {
    pub obj_id: [i64; 5],
    pub hole_type: String,
    pub obj_type: String,
    pub ra: f64,
    pub dec: f64,
    pub mag: [f64; 5],
    pub x_focal: f64,
    pub y_focal: f64,
    pub spectrograph_id: i64,
    pub fiber_id: i64,
    pub throughput: i64,
    pub prim_target: i64,
    pub sec_target: i64,
}

/// One hole from the drilling (planning) file.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedHole {
    pub hole_type: String,
    /// Targeting category (`science`, `sky`, `standard`, `na` in plate files).
    pub category: String,
    pub source_type: String,
    pub target_ra: f64,
    pub target_dec: f64,
    /// Raw identifier string drilled into the plate file.
    pub target_ids: String,
    pub fiber_id: i64,
    pub block: i64,
    pub x_focal: f64,
    pub y_focal: f64,
    pub diameter: f64,
    pub buffer: f64,
    pub priority: i64,
    pub assigned: i64,
    pub conflicted: i64,
}

/// A plugged hole paired with its planned hole.
#[derive(Debug, Clone, Serialize)]
pub struct PlateTarget {
    // Plugged-hole fields
    pub obj_id: [i64; 5],
    pub hole_type: String,
    pub obj_type: String,
    pub ra: f64,
    pub dec: f64,
    pub mag: [f64; 5],
    pub x_focal: f64,
    pub y_focal: f64,
    pub spectrograph_id: i64,
    /// Fiber id, with the miswired-interval correction already applied.
    pub fiber_id: i64,
    pub throughput: i64,
    pub prim_target: i64,
    pub sec_target: i64,

    // Planned-hole fields
    pub planned_hole_type: String,
    /// Category normalized to the FPS-era vocabulary.
    pub category: String,
    pub source_type: String,
    pub target_ra: f64,
    pub target_dec: f64,
    pub target_ids: String,
    pub planned_fiber_id: i64,
    pub block: i64,
    pub diameter: f64,
    pub priority: i64,
    pub assigned: i64,

    /// Resolved master catalog id; sentinel until back-filled.
    pub sdss_id: i64,
}

impl TargetIdentity for PlateTarget {
    fn category(&self) -> &str {
        &self.category
    }

    fn sdss_id(&self) -> i64 {
        self.sdss_id
    }

    fn set_sdss_id(&mut self, sdss_id: i64) {
        self.sdss_id = sdss_id;
    }

    fn candidate_ids(&self) -> CandidateIds {
        match parse_input_id(&self.target_ids) {
            Some((kind, id)) => smallvec![(kind, id)],
            None => CandidateIds::new(),
        }
    }
}

/// Normalize a plate-era category to the FPS-era vocabulary so downstream code
/// sees one naming scheme across both eras.
fn normalize_category(category: &str) -> String {
    match category.to_ascii_lowercase().as_str() {
        "sky" => "sky_apogee".to_string(),
        "standard" => "standard_apogee".to_string(),
        "na" => String::new(),
        other => other.to_string(),
    }
}

/// Whether a plate plugged at `observatory` on `plugged_mjd` falls in one of the
/// miswired harness intervals.
fn plug_is_miswired(observatory: Observatory, plugged_mjd: Mjd) -> bool {
    observatory == Observatory::Apo
        && APO_MISWIRED_PLUG_MJD_RANGES
            .iter()
            .any(|&(start, end)| (start..=end).contains(&plugged_mjd))
}

/// Correct a recorded fiber id for a miswired plugging interval.
fn correct_fiber_id(fiber_id: i64, miswired: bool) -> i64 {
    if miswired && (1..=PLATE_FIBER_ID_MAX).contains(&fiber_id) {
        PLATE_FIBER_ID_MAX + 1 - fiber_id
    } else {
        fiber_id
    }
}

/// Pair plugged holes with planned holes by coordinate proximity.
///
/// Arguments
/// -----------------
/// * `plate_id`: plate identifier, for diagnostics.
/// * `observatory`, `plugged_mjd`: where and when the plate was plugged, for the
///   fiber-id correction.
/// * `planned`: drilling-file holes; filtered to this spectrograph's hole types.
/// * `plugged`: plug-map holes; filtered to this spectrograph's id.
///
/// Return
/// ----------
/// * One [`PlateTarget`] per unambiguously matched plugged hole, or
///   [`AlmanacError::AmbiguousPlugMatch`] as soon as any plugged hole matches
///   more than one planned hole within tolerance — no partial list is returned.
///   Plugged holes matching nothing are dropped.
pub fn match_planned_to_plugged(
    plate_id: i64,
    observatory: Observatory,
    plugged_mjd: Mjd,
    planned: &[PlannedHole],
    plugged: &[PluggedHole],
) -> Result<Vec<PlateTarget>, AlmanacError> {
    let planned: Vec<&PlannedHole> = planned
        .iter()
        .filter(|hole| SPECTROGRAPH_HOLE_TYPES.contains(&hole.hole_type.as_str()))
        .collect();
    let plugged: Vec<&PluggedHole> = plugged
        .iter()
        .filter(|hole| hole.spectrograph_id == SPECTROGRAPH_ID)
        .collect();

    let miswired = plug_is_miswired(observatory, plugged_mjd);
    let mut targets = Vec::with_capacity(plugged.len());

    for (plugged_index, hole) in plugged.iter().enumerate() {
        let in_tolerance: Vec<&&PlannedHole> = planned
            .iter()
            .filter(|p| {
                (p.target_ra - hole.ra).abs() < PLUG_MATCH_TOLERANCE
                    && (p.target_dec - hole.dec).abs() < PLUG_MATCH_TOLERANCE
            })
            .collect();

        match in_tolerance.len() {
            0 => continue,
            1 => {}
            n => {
                log::warn!(
                    "plate {plate_id}: plugged hole {plugged_index} \
                     (ra={:.5}, dec={:.5}) matches {n} planned holes within {PLUG_MATCH_TOLERANCE:.1e}",
                    hole.ra,
                    hole.dec
                );
                for (i, p) in in_tolerance.iter().enumerate() {
                    log::warn!(
                        "\t{}. planned hole at (ra={:.5}, dec={:.5})",
                        i + 1,
                        p.target_ra,
                        p.target_dec
                    );
                }
                return Err(AlmanacError::AmbiguousPlugMatch {
                    plate_id,
                    plugged_index,
                    n_planned: n,
                });
            }
        }

        // Exactly one candidate; nearest by construction.
        let plan: &PlannedHole = in_tolerance[0];
        targets.push(PlateTarget {
            obj_id: hole.obj_id,
            hole_type: hole.hole_type.to_ascii_lowercase(),
            obj_type: hole.obj_type.clone(),
            ra: hole.ra,
            dec: hole.dec,
            mag: hole.mag,
            x_focal: hole.x_focal,
            y_focal: hole.y_focal,
            spectrograph_id: hole.spectrograph_id,
            fiber_id: correct_fiber_id(hole.fiber_id, miswired),
            throughput: hole.throughput,
            prim_target: hole.prim_target,
            sec_target: hole.sec_target,
            planned_hole_type: plan.hole_type.to_ascii_lowercase(),
            category: normalize_category(&plan.category),
            source_type: plan.source_type.clone(),
            target_ra: plan.target_ra,
            target_dec: plan.target_dec,
            target_ids: plan.target_ids.clone(),
            planned_fiber_id: plan.fiber_id,
            block: plan.block,
            diameter: plan.diameter,
            priority: plan.priority,
            assigned: plan.assigned,
            sdss_id: SDSS_ID_UNRESOLVED,
        });
    }

    Ok(targets)
}

#[cfg(test)]
mod plate_test {
    use super::*;

    pub(crate) fn planned_hole(ra: f64, dec: f64, target_ids: &str) -> PlannedHole {
        PlannedHole {
            hole_type: "APOGEE".to_string(),
            category: "science".to_string(),
            source_type: "star".to_string(),
            target_ra: ra,
            target_dec: dec,
            target_ids: target_ids.to_string(),
            fiber_id: 17,
            block: 2,
            x_focal: 0.0,
            y_focal: 0.0,
            diameter: 2.167,
            buffer: 0.3,
            priority: 1,
            assigned: 1,
            conflicted: 0,
        }
    }

    pub(crate) fn plugged_hole(ra: f64, dec: f64, fiber_id: i64) -> PluggedHole {
        PluggedHole {
            obj_id: [0; 5],
            hole_type: "OBJECT".to_string(),
            obj_type: "STAR_BHB".to_string(),
            ra,
            dec,
            mag: [f64::NAN; 5],
            x_focal: 0.0,
            y_focal: 0.0,
            spectrograph_id: SPECTROGRAPH_ID,
            fiber_id,
            throughput: 0,
            prim_target: 0,
            sec_target: 0,
        }
    }

    #[test]
    fn test_unique_match_pairs_fields() {
        let planned = vec![
            planned_hole(180.0, 0.0, "2MASS-J12345678+1234567"),
            planned_hole(181.0, 1.0, "2MASS-J23456789+2345678"),
        ];
        let plugged = vec![plugged_hole(180.0 + 4e-6, 0.0 - 4e-6, 120)];

        let targets =
            match_planned_to_plugged(8297, Observatory::Apo, 57_131, &planned, &plugged).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_ids, "2MASS-J12345678+1234567");
        assert_eq!(targets[0].fiber_id, 120);
        assert_eq!(targets[0].category, "science");
        assert_eq!(targets[0].sdss_id, SDSS_ID_UNRESOLVED);
    }

    #[test]
    fn test_ambiguous_match_is_fatal() {
        let planned = vec![
            planned_hole(180.0, 0.0, "a"),
            planned_hole(180.0 + 2e-6, 0.0, "b"),
        ];
        let plugged = vec![plugged_hole(180.0, 0.0, 1)];

        let err = match_planned_to_plugged(8297, Observatory::Apo, 57_131, &planned, &plugged)
            .unwrap_err();
        assert_eq!(
            err,
            AlmanacError::AmbiguousPlugMatch {
                plate_id: 8297,
                plugged_index: 0,
                n_planned: 2,
            }
        );
    }

    #[test]
    fn test_foreign_holes_are_filtered() {
        let mut boss_hole = planned_hole(180.0, 0.0, "a");
        boss_hole.hole_type = "BOSS".to_string();
        let mut other_spec = plugged_hole(180.0, 0.0, 1);
        other_spec.spectrograph_id = 1;

        let targets = match_planned_to_plugged(
            8297,
            Observatory::Apo,
            57_131,
            &[boss_hole],
            &[other_spec],
        )
        .unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_unmatched_plugged_hole_is_dropped() {
        let planned = vec![planned_hole(180.0, 0.0, "a")];
        let plugged = vec![plugged_hole(10.0, 10.0, 1)];
        let targets =
            match_planned_to_plugged(8297, Observatory::Apo, 57_131, &planned, &plugged).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_category_normalization() {
        assert_eq!(normalize_category("sky"), "sky_apogee");
        assert_eq!(normalize_category("STANDARD"), "standard_apogee");
        assert_eq!(normalize_category("NA"), "");
        assert_eq!(normalize_category("science"), "science");
    }

    #[test]
    fn test_miswired_interval_reflects_fiber_ids() {
        assert!(plug_is_miswired(Observatory::Apo, 56_850));
        assert!(!plug_is_miswired(Observatory::Apo, 56_861));
        assert!(!plug_is_miswired(Observatory::Lco, 56_850));

        assert_eq!(correct_fiber_id(1, true), 300);
        assert_eq!(correct_fiber_id(300, true), 1);
        assert_eq!(correct_fiber_id(120, false), 120);
        // Sentinel fiber ids are left alone even in miswired intervals.
        assert_eq!(correct_fiber_id(-1, true), -1);
    }
}
