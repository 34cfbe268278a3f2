//! # Exposures: discovery, reconciliation, and sequence detection
//!
//! Everything that turns raw files and operations-database records into one
//! gap-free, ascending exposure timeline per (observatory, night), and then into
//! observationally coherent sequences.
//!
//! Modules
//! -----------------
//! * [`exposure`](crate::exposures::exposure) – The [`Exposure`] record and the
//!   header-value coercions applied at construction.
//! * [`headers`](crate::exposures::headers) – Raw header-card scanning for one
//!   exposure file.
//! * [`discovery`](crate::exposures::discovery) – On-disk listing with multi-chip
//!   collapse.
//! * [`reconcile`](crate::exposures::reconcile) – Merge of on-disk and expected
//!   records into a gap-free timeline with diagnostics.
//! * [`sequence`](crate::exposures::sequence) – Partition of a timeline into
//!   contiguous same-key sequences.

pub mod discovery;
pub mod exposure;
pub mod headers;
pub mod reconcile;
pub mod sequence;

pub use exposure::{Exposure, ImageType};
pub use reconcile::{ExpectedExposure, ExpectedSource, NoExpectedSource, ReconciledNight};
pub use sequence::{Sequence, SequenceOptions};
