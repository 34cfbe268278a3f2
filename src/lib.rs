pub mod almanac;
pub mod almanac_errors;
pub mod config;
pub mod constants;
pub mod exposures;
pub mod identifiers;
pub mod nights;
pub mod targets;

pub use crate::almanac::{Almanac, NightData, NightOptions, NightSequences};
pub use crate::almanac_errors::AlmanacError;
pub use crate::config::AlmanacConfig;
pub use crate::constants::{Chip, ExposureNumber, Mjd, Observatory};
pub use crate::exposures::reconcile::{
    reconcile_night, ExpectedExposure, ExpectedSource, NoExpectedSource, ReconcileOptions,
    ReconciledNight,
};
pub use crate::exposures::sequence::{
    arclamp_sequences, detect_sequences, science_sequences, Sequence, SequenceOptions,
};
pub use crate::exposures::{Exposure, ImageType};
pub use crate::identifiers::{IdentifierKind, IdentifierResolver, OfflineResolver};
pub use crate::targets::{
    attach_targets, match_planned_to_plugged, AttachmentOptions, FiberMaps, FpsTarget,
    NoTargetSource, PlannedHole, PlateTarget, PluggedHole, TargetIdentity, TargetSource,
};
