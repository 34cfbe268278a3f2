//! # Robotic fiber-positioner targets
//!
//! One [`FpsTarget`] per fiber of a positioner configuration, as recorded in the
//! configuration summary file for the exposure's `config_id`. Records arrive
//! already parsed from the external file boundary
//! ([`TargetSource`](crate::targets::source::TargetSource)); this module only
//! defines the shape and the identity contract.

use serde::Serialize;
use smallvec::smallvec;

use crate::constants::SDSS_ID_UNRESOLVED;
use crate::identifiers::IdentifierKind;
use crate::targets::{CandidateIds, TargetIdentity};

/// A target observed with the robotic fiber positioning system.
#[derive(Debug, Clone, Serialize)]
pub struct FpsTarget {
    pub positioner_id: i64,
    pub hole_id: String,
    pub fiber_type: String,

    /// Target assigned to this fiber by the robot scheduler. When false, no
    /// targeting information is available for this fiber.
    pub assigned: bool,
    /// Fiber placed on target.
    pub on_target: bool,
    /// Fiber is disabled.
    pub disabled: bool,
    /// On-sky coordinates converted to a reachable robot (α, β).
    pub valid: bool,
    /// Positioner was moved off target to avoid a collision.
    pub decollided: bool,

    // Focal plane and wok coordinates
    pub xwok: f64,
    pub ywok: f64,
    pub zwok: f64,
    pub x_focal: f64,
    pub y_focal: f64,
    pub alpha: f64,
    pub beta: f64,

    // Catalog coordinates
    pub ra_cat: f64,
    pub dec_cat: f64,
    pub pmra: f64,
    pub pmdec: f64,
    pub parallax: f64,

    // Observed coordinates
    pub ra: f64,
    pub dec: f64,
    pub lambda_eff: f64,
    pub coord_epoch: f64,

    pub spectrograph_id: i64,
    pub fiber_id: i64,

    // Magnitudes
    pub mag: [f64; 5],
    pub optical_prov: String,
    pub bp_mag: f64,
    pub gaia_g_mag: f64,
    pub rp_mag: f64,
    pub h_mag: f64,

    // Targeting metadata
    pub catalogid: i64,
    pub carton_to_target_pk: i64,
    pub cadence: String,
    pub firstcarton: String,
    pub program: String,
    pub category: String,
    pub sdssv_boss_target0: i64,
    pub sdssv_apogee_target0: i64,
    pub delta_ra: f64,
    pub delta_dec: f64,

    /// Resolved master catalog id; sentinel until back-filled.
    pub sdss_id: i64,
}

impl Default for FpsTarget {
    fn default() -> Self {
        FpsTarget {
            positioner_id: -1,
            hole_id: String::new(),
            fiber_type: String::new(),
            assigned: false,
            on_target: false,
            disabled: false,
            valid: false,
            decollided: false,
            xwok: f64::NAN,
            ywok: f64::NAN,
            zwok: f64::NAN,
            x_focal: f64::NAN,
            y_focal: f64::NAN,
            alpha: f64::NAN,
            beta: f64::NAN,
            ra_cat: f64::NAN,
            dec_cat: f64::NAN,
            pmra: f64::NAN,
            pmdec: f64::NAN,
            parallax: f64::NAN,
            ra: f64::NAN,
            dec: f64::NAN,
            lambda_eff: 0.0,
            coord_epoch: 0.0,
            spectrograph_id: -1,
            fiber_id: -1,
            mag: [f64::NAN; 5],
            optical_prov: String::new(),
            bp_mag: f64::NAN,
            gaia_g_mag: f64::NAN,
            rp_mag: f64::NAN,
            h_mag: f64::NAN,
            catalogid: -1,
            carton_to_target_pk: -1,
            cadence: String::new(),
            firstcarton: String::new(),
            program: String::new(),
            category: String::new(),
            sdssv_boss_target0: 0,
            sdssv_apogee_target0: 0,
            delta_ra: 0.0,
            delta_dec: 0.0,
            sdss_id: SDSS_ID_UNRESOLVED,
        }
    }
}

impl TargetIdentity for FpsTarget {
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
        if self.catalogid > 0 {
            smallvec![(IdentifierKind::Catalog, self.catalogid.to_string())]
        } else {
            CandidateIds::new()
        }
    }
}
