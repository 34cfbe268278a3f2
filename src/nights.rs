//! # Multi-night driver
//!
//! Iterates the per-night pipeline over (observatory × MJD range) keys. A
//! failing night is logged and skipped (one corrupt night must never abort a
//! season-long sweep), and results come back ordered by (observatory, mjd) so
//! callers can write them out deterministically.
//!
//! Each (observatory, night) key is processed independently with no shared
//! mutable state, so callers that want wall-clock speed may fan the same calls
//! out across worker processes and concatenate the results; this driver is the
//! plain sequential reference.
//!
//! With the `progress` feature enabled a live progress bar tracks the sweep.

use hifitime::Epoch;

use crate::almanac::{Almanac, NightData, NightOptions};
use crate::constants::{Mjd, Observatory};
use crate::exposures::reconcile::ExpectedSource;
use crate::targets::source::TargetSource;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Current MJD (UTC), for resolving relative night specifications.
pub fn current_mjd() -> Mjd {
    Epoch::now()
        .map(|epoch| epoch.to_mjd_utc_days().floor() as Mjd)
        .unwrap_or(0)
}

/// Resolve an optional `(start, end)` night specification into an inclusive
/// range.
///
/// Either bound may be omitted (start falls back to `earliest`, end to the
/// current night) or negative (relative to the current night), mirroring the
/// conventions of the surrounding tooling.
pub fn resolve_mjd_range(
    start: Option<Mjd>,
    end: Option<Mjd>,
    earliest: Mjd,
) -> std::ops::RangeInclusive<Mjd> {
    let now = current_mjd();
    let resolve = |bound: Mjd| if bound < 0 { now + bound } else { bound };
    let start = start.map(resolve).unwrap_or(earliest);
    let end = end.map(resolve).unwrap_or(now);
    start..=end
}

/// Run the per-night pipeline across sites and nights.
///
/// Arguments
/// -----------------
/// * `almanac`: the shared context (configuration + resolver handle).
/// * `observatories`: sites to sweep, typically [`Observatory::ALL`].
/// * `mjds`: inclusive night range.
/// * `expected`, `targets`, `options`: forwarded to
///   [`Almanac::night_data`](crate::almanac::Almanac::night_data).
///
/// Return
/// ----------
/// * One [`NightData`] per key that processed successfully, ordered by
///   (observatory, mjd). Failed keys are logged and skipped.
pub fn night_data_range(
    almanac: &Almanac,
    observatories: &[Observatory],
    mjds: std::ops::RangeInclusive<Mjd>,
    expected: &dyn ExpectedSource,
    targets: Option<&dyn TargetSource>,
    options: &NightOptions,
) -> Vec<NightData> {
    let n_keys = observatories.len() as u64 * (mjds.end() - mjds.start() + 1).max(0) as u64;
    let mut results = Vec::new();

    #[cfg(feature = "progress")]
    let bar = {
        let bar = ProgressBar::new(n_keys.max(1));
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} nights [{elapsed_precise}] {msg}",
            )
            .expect("indicatif template"),
        );
        bar
    };
    #[cfg(not(feature = "progress"))]
    let _ = n_keys;

    for &observatory in observatories {
        for mjd in mjds.clone() {
            #[cfg(feature = "progress")]
            bar.set_message(format!("{observatory}/{mjd}"));

            match almanac.night_data(observatory, mjd, expected, targets, options) {
                Ok(night) => results.push(night),
                Err(e) => {
                    log::error!("{observatory}/{mjd}: night failed, continuing sweep: {e}");
                }
            }

            #[cfg(feature = "progress")]
            bar.inc(1);
        }
    }

    #[cfg(feature = "progress")]
    bar.finish_and_clear();

    results.sort_by_key(|night| (night.observatory.name(), night.mjd));
    results
}
