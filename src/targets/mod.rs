//! # Targets: fiber maps and master-identifier attachment
//!
//! A science exposure observes a set of *targets*, one per plugged fiber. Two
//! eras, two shapes: [`FpsTarget`] for robotic positioner configurations and
//! [`PlateTarget`] for drilled plates (where the plugged reality must first be
//! spatially matched to the drilled plan). Both share the identity contract of
//! [`TargetIdentity`], which is what the master-identifier back-fill operates on.
//!
//! Modules
//! -----------------
//! * [`fps`](crate::targets::fps) – Robotic fiber assignment records.
//! * [`plate`](crate::targets::plate) – Plate hole records and the
//!   planned-to-plugged spatial match.
//! * [`source`](crate::targets::source) – The external fiber-map file boundary.
//! * [`attachment`](crate::targets::attachment) – Per-sequence fetch, batched
//!   resolution, and back-fill.

pub mod attachment;
pub mod fps;
pub mod plate;
pub mod source;

pub use attachment::{attach_targets, AttachmentOptions, FiberMaps};
pub use fps::FpsTarget;
pub use plate::{match_planned_to_plugged, PlannedHole, PlateTarget, PluggedHole};
pub use source::{NoTargetSource, TargetSource};

use smallvec::SmallVec;

use crate::identifiers::IdentifierKind;

/// Candidate identifiers a single target could resolve through, in no
/// particular order; the back-fill applies [`IdentifierKind::PRIORITY`].
pub type CandidateIds = SmallVec<[(IdentifierKind, String); 2]>;

/// Identity contract shared by both target shapes.
pub trait TargetIdentity {
    /// Targeting category (`science`, `sky_apogee`, `standard_apogee`, ...).
    fn category(&self) -> &str;

    /// Resolved master catalog id, or the sentinel when unresolved.
    fn sdss_id(&self) -> i64;

    fn set_sdss_id(&mut self, sdss_id: i64);

    /// The identifiers this target could be resolved through.
    fn candidate_ids(&self) -> CandidateIds;

    /// Whether this target should end up with a master catalog id: non-sky and
    /// carrying at least one usable identifier.
    fn expected_to_be_assigned_sdss_id(&self) -> bool {
        !self.category().starts_with("sky") && !self.candidate_ids().is_empty()
    }
}
