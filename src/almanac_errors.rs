use thiserror::Error;

use crate::constants::{ExposureNumber, Mjd};

#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    MalformedConfig(String),

    #[error("Unknown observatory: {0}")]
    UnknownObservatory(String),

    #[error(
        "Plugged hole {plugged_index} of plate {plate_id} matches {n_planned} planned holes \
         within tolerance; cannot uniquely match plugged holes to planned holes"
    )]
    AmbiguousPlugMatch {
        plate_id: i64,
        plugged_index: usize,
        n_planned: usize,
    },

    #[error("Target list unavailable: {0}")]
    TargetFileUnavailable(String),

    #[error("Expected-exposure source failed for {observatory} on MJD {mjd}: {reason}")]
    ExpectedSourceFailed {
        observatory: String,
        mjd: Mjd,
        reason: String,
    },

    #[error("No exposure found on disk for {observatory} MJD {mjd} exposure {exposure}")]
    ExposureFileNotFound {
        observatory: String,
        mjd: Mjd,
        exposure: ExposureNumber,
    },
}

impl PartialEq for AlmanacError {
    fn eq(&self, other: &Self) -> bool {
        use AlmanacError::*;
        match (self, other) {
            // Io errors are not comparable: equal if same variant.
            (IoError(_), IoError(_)) => true,

            (MalformedConfig(a), MalformedConfig(b)) => a == b,
            (UnknownObservatory(a), UnknownObservatory(b)) => a == b,
            (
                AmbiguousPlugMatch {
                    plate_id: a1,
                    plugged_index: a2,
                    n_planned: a3,
                },
                AmbiguousPlugMatch {
                    plate_id: b1,
                    plugged_index: b2,
                    n_planned: b3,
                },
            ) => (a1, a2, a3) == (b1, b2, b3),
            (TargetFileUnavailable(a), TargetFileUnavailable(b)) => a == b,
            (
                ExpectedSourceFailed {
                    observatory: a1,
                    mjd: a2,
                    reason: a3,
                },
                ExpectedSourceFailed {
                    observatory: b1,
                    mjd: b2,
                    reason: b3,
                },
            ) => (a1, a2, a3) == (b1, b2, b3),
            (
                ExposureFileNotFound {
                    observatory: a1,
                    mjd: a2,
                    exposure: a3,
                },
                ExposureFileNotFound {
                    observatory: b1,
                    mjd: b2,
                    exposure: b3,
                },
            ) => (a1, a2, a3) == (b1, b2, b3),

            _ => false,
        }
    }
}
