//! # Target identifiers and master-catalog resolution
//!
//! Fiber maps carry target identifiers in several historical flavors: numeric input
//! catalog ids (FPS era), 2MASS-style designations, and Gaia-style designations
//! (plate era, free-form strings drilled into the plate files). This module
//! normalizes those strings into an [`IdentifierKind`] plus a cleaned identifier,
//! and defines the [`IdentifierResolver`] boundary through which cleaned
//! identifiers are exchanged for master catalog ids in **batched** queries.
//!
//! ## Resolution model
//!
//! Each identifier moves through `unresolved → pending-lookup → resolved` or
//! `unresolved → sentinel`. There are no retries: an identifier absent from the
//! batched lookup result simply keeps the sentinel
//! [`SDSS_ID_UNRESOLVED`](crate::constants::SDSS_ID_UNRESOLVED). When a target
//! could resolve through more than one kind, the first hit in
//! [`IdentifierKind::PRIORITY`] order wins.
//!
//! An unavailable backend is **not an error**: [`OfflineResolver`] returns empty
//! lookup tables and the rest of the pipeline proceeds with sentinels.

use ahash::AHashMap;

use crate::almanac_errors::AlmanacError;
use crate::constants::RESOLVER_CHUNK_SIZE;

/// The flavor of a target identifier, deciding which batched query resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IdentifierKind {
    /// Numeric input-catalog identifier.
    Catalog,
    /// Gaia source designation (any data release; normalized to the bare source id).
    Gaia,
    /// 2MASS point-source designation.
    TwoMass,
}

impl IdentifierKind {
    /// Fixed tie-break order when a target could resolve through several kinds.
    pub const PRIORITY: [IdentifierKind; 3] = [
        IdentifierKind::Catalog,
        IdentifierKind::Gaia,
        IdentifierKind::TwoMass,
    ];
}

/// Classify a raw identifier string into a kind and a cleaned identifier.
///
/// The input might be a 2MASS-style designation (in many different formats), a
/// Gaia-style designation, or a bare input-catalog identifier. Returns `None`
/// for empty/`NA` markers and for strings that fit no known flavor.
///
/// Arguments
/// -----------------
/// * `input_id`: the raw identifier string as found in a fiber-map file.
///
/// Return
/// ----------
/// * `Some((kind, cleaned))`, or `None` when the string is unresolvable.
pub fn parse_input_id(input_id: &str) -> Option<(IdentifierKind, String)> {
    let cleaned = input_id.trim().to_ascii_lowercase();
    if cleaned.is_empty() || cleaned == "na" {
        return None;
    }

    if cleaned.starts_with("gaia") {
        // Forms like "gaia_dr2 4111834567779557376"; the master table keys Gaia
        // sources by the bare source id, so the release tag is dropped.
        let source_id = cleaned.split_whitespace().nth(1)?;
        if source_id.chars().all(|c| c.is_ascii_digit()) {
            return Some((IdentifierKind::Gaia, source_id.to_string()));
        }
        return None;
    }

    if cleaned.starts_with("2m") || cleaned.starts_with('j') {
        let stripped = cleaned
            .strip_prefix("2mass")
            .or_else(|| cleaned.strip_prefix("2m"))
            .unwrap_or(&cleaned);
        let designation = stripped.trim_start_matches(['-', 'j', 'd', 'b', '_']);
        if designation.is_empty() {
            return None;
        }
        return Some((IdentifierKind::TwoMass, designation.to_string()));
    }

    if cleaned.parse::<i64>().is_ok() {
        return Some((IdentifierKind::Catalog, cleaned));
    }

    None
}

/// A lookup table from cleaned identifier to master catalog id.
pub type IdentifierLookup = AHashMap<String, i64>;

/// Boundary to the master-catalog resolution backend.
///
/// Implementations are constructed per worker/process (a live database handle
/// must never be inherited across a process boundary) and queried in batches.
/// Backends that cannot be reached report `is_available() == false` and return
/// empty tables, never errors.
pub trait IdentifierResolver {
    /// Whether the backend can currently be queried.
    fn is_available(&self) -> bool;

    /// Resolve one batch of cleaned identifiers of a single kind.
    ///
    /// Identifiers absent from the returned table are unresolved. Implementations
    /// should not be handed more than
    /// [`RESOLVER_CHUNK_SIZE`](crate::constants::RESOLVER_CHUNK_SIZE) identifiers
    /// per call; use [`resolve_all`] for arbitrarily large id sets.
    fn resolve(
        &self,
        kind: IdentifierKind,
        ids: &[String],
    ) -> Result<IdentifierLookup, AlmanacError>;
}

/// Resolver used when no backend is configured or reachable.
///
/// Every lookup is empty, so every target keeps the sentinel identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineResolver;

impl IdentifierResolver for OfflineResolver {
    fn is_available(&self) -> bool {
        false
    }

    fn resolve(
        &self,
        _kind: IdentifierKind,
        _ids: &[String],
    ) -> Result<IdentifierLookup, AlmanacError> {
        Ok(IdentifierLookup::new())
    }
}

/// Resolve an arbitrarily large identifier set, chunking the batched queries and
/// merging the chunk results into one table.
///
/// Chunks are issued sequentially; callers that parallelize chunks themselves
/// must still merge into a single table before back-filling so the fixed
/// kind-priority tie-break stays deterministic.
pub fn resolve_all(
    resolver: &dyn IdentifierResolver,
    kind: IdentifierKind,
    ids: &[String],
) -> Result<IdentifierLookup, AlmanacError> {
    let mut lookup = IdentifierLookup::with_capacity(ids.len());
    if !resolver.is_available() {
        return Ok(lookup);
    }
    for chunk in ids.chunks(RESOLVER_CHUNK_SIZE) {
        lookup.extend(resolver.resolve(kind, chunk)?);
    }
    Ok(lookup)
}
