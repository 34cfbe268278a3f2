//! # Almanac: configuration, resolver handle, and the per-night pipeline
//!
//! This module defines the [`Almanac`] struct, the central façade that wires together:
//!
//! 1. **Configuration** ([`AlmanacConfig`](crate::config::AlmanacConfig)) — filesystem
//!    roots and per-site thresholds.
//! 2. **Master-identifier resolution** — a lazy, cached handle over a caller-supplied
//!    [`IdentifierResolver`](crate::identifiers::IdentifierResolver) backend.
//! 3. **The one-night pipeline** — discovery → reconciliation → sequence detection →
//!    target attachment, through [`Almanac::night_data`].
//!
//! The design emphasizes *lazy initialization* and *per-worker ownership*:
//! the resolver backend is only established on first use via
//! [`OnceCell`](once_cell::sync::OnceCell), and each `Almanac` owns its own handle.
//! A live backend connection is never inherited across worker processes, which is
//! what makes per-(observatory, night) fan-out safe.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use almanac::almanac::{Almanac, NightOptions};
//! use almanac::config::AlmanacConfig;
//! use almanac::constants::Observatory;
//! use almanac::exposures::NoExpectedSource;
//!
//! let almanac = Almanac::new(AlmanacConfig::load().unwrap());
//! let night = almanac
//!     .night_data(
//!         Observatory::Apo,
//!         60_100,
//!         &NoExpectedSource,
//!         None,
//!         &NightOptions::default(),
//!     )
//!     .unwrap();
//! for message in &night.messages {
//!     eprintln!("{message}");
//! }
//! ```

use once_cell::sync::OnceCell;

use crate::almanac_errors::AlmanacError;
use crate::config::AlmanacConfig;
use crate::constants::{Mjd, Observatory};
use crate::exposures::discovery::list_night_exposures;
use crate::exposures::exposure::Exposure;
use crate::exposures::reconcile::{reconcile_night, ExpectedSource, ReconcileOptions};
use crate::exposures::sequence::{
    arclamp_sequences, science_sequences, Sequence, SequenceOptions,
};
use crate::identifiers::{IdentifierResolver, OfflineResolver};
use crate::targets::attachment::{attach_targets, AttachmentOptions, FiberMaps};
use crate::targets::source::TargetSource;

/// Factory producing a resolver backend on first use.
pub type ResolverFactory = Box<dyn Fn() -> Box<dyn IdentifierResolver> + Send + Sync>;

/// Policy knobs for one night of processing.
#[derive(Default)]
pub struct NightOptions {
    pub reconcile: ReconcileOptions,
    pub sequences: SequenceOptions,
    pub attachment: AttachmentOptions,
}

/// Detected sequences of one timeline, by policy.
#[derive(Debug, Clone, Default)]
pub struct NightSequences {
    /// Science sequences: object exposures on (field, plate, config, type).
    pub objects: Vec<Sequence>,
    /// Calibration sequences: arc-lamp exposures on dither position.
    pub arclamps: Vec<Sequence>,
}

/// Everything the almanac knows about one (observatory, night) pair.
#[derive(Debug)]
pub struct NightData {
    pub observatory: Observatory,
    pub mjd: Mjd,
    /// Gap-free timeline, ascending by exposure number.
    pub exposures: Vec<Exposure>,
    /// Diagnostics for every synthesized placeholder.
    pub messages: Vec<String>,
    pub sequences: NightSequences,
    /// Fiber maps for the science sequences; empty when no target source was given.
    pub fiber_maps: FiberMaps,
}

/// Central façade: configuration plus the lazily-established resolver handle.
pub struct Almanac {
    config: AlmanacConfig,
    resolver_factory: Option<ResolverFactory>,
    resolver: OnceCell<Box<dyn IdentifierResolver>>,
}

impl Almanac {
    /// Construct a new [`Almanac`] context with no resolution backend; every
    /// identifier lookup degrades to the sentinel until a factory is installed.
    pub fn new(config: AlmanacConfig) -> Self {
        Almanac {
            config,
            resolver_factory: None,
            resolver: OnceCell::new(),
        }
    }

    /// Install a resolver factory, invoked lazily on first resolution.
    ///
    /// Construct the factory per worker/process: the backend it creates is owned
    /// by this instance and must not be shared across process boundaries.
    pub fn with_resolver_factory(mut self, factory: ResolverFactory) -> Self {
        self.resolver_factory = Some(factory);
        self
    }

    pub fn config(&self) -> &AlmanacConfig {
        &self.config
    }

    /// Get the lazily-initialized resolver handle.
    ///
    /// The first call invokes the installed factory (or falls back to the
    /// offline resolver); subsequent calls return the same backend.
    pub fn resolver(&self) -> &dyn IdentifierResolver {
        self.resolver
            .get_or_init(|| match &self.resolver_factory {
                Some(factory) => factory(),
                None => Box::new(OfflineResolver),
            })
            .as_ref()
    }

    /// Run the full pipeline for one (observatory, night) pair.
    ///
    /// Arguments
    /// -----------------
    /// * `observatory`, `mjd`: the night key.
    /// * `expected`: authoritative expected-exposure source; a failing source is
    ///   absorbed (the night reconciles against an empty expectation).
    /// * `targets`: fiber-map boundary; `None` skips target attachment.
    /// * `options`: see [`NightOptions`].
    ///
    /// Return
    /// ----------
    /// * The night's [`NightData`]. The only hard errors are filesystem failures
    ///   during discovery and an ambiguous planned-to-plugged match.
    pub fn night_data(
        &self,
        observatory: Observatory,
        mjd: Mjd,
        expected: &dyn ExpectedSource,
        targets: Option<&dyn TargetSource>,
        options: &NightOptions,
    ) -> Result<NightData, AlmanacError> {
        let on_disk = list_night_exposures(&self.config, observatory, mjd)?;
        log::debug!("{observatory}/{mjd}: {} exposures on disk", on_disk.len());

        let expected_map = match expected.expected_exposures(observatory, mjd) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("{observatory}/{mjd}: expected-exposure source failed: {e}");
                Default::default()
            }
        };

        let reconciled = reconcile_night(
            observatory,
            mjd,
            on_disk,
            expected_map,
            self.config.expected_coverage_start.get(observatory),
            &options.reconcile,
        );

        let sequences = NightSequences {
            objects: science_sequences(&reconciled.exposures, &options.sequences),
            arclamps: arclamp_sequences(&reconciled.exposures, &options.sequences),
        };
        log::debug!(
            "{observatory}/{mjd}: {} object sequences, {} arclamp sequences",
            sequences.objects.len(),
            sequences.arclamps.len()
        );

        let fiber_maps = match targets {
            Some(source) => attach_targets(
                &reconciled.exposures,
                &sequences.objects,
                source,
                self.resolver(),
                &options.attachment,
            )?,
            None => FiberMaps::default(),
        };

        Ok(NightData {
            observatory,
            mjd,
            exposures: reconciled.exposures,
            messages: reconciled.messages,
            sequences,
            fiber_maps,
        })
    }
}

impl std::fmt::Debug for Almanac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Almanac")
            .field("config", &self.config)
            .field("resolver_installed", &self.resolver.get().is_some())
            .finish()
    }
}
