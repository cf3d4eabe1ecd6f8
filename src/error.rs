use crate::codec;
use thiserror::Error;

pub use codec::RecordKind;

/// Errors returned by the configuration store. Integrity failures of the
/// profile, GPS and usage log records are healed internally and reported
/// through the `bool` returned by the corresponding `load_*` call, so a caller
/// usually only has to care about `StorageError` and the waypoint errors.
#[derive(Error, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The internal error value is returned from the provided storage. The
    /// store refuses further writes once this has happened.
    #[error("internal storage error")]
    StorageError,

    /// The records of the selected feature set don't fit into the storage.
    #[error("layout needs {required} bytes but storage only has {capacity}")]
    LayoutOverflow { required: usize, capacity: usize },

    /// Waypoint sequence number is above 254 or beyond the waypoint region.
    #[error("waypoint {0} out of range")]
    WaypointOutOfRange(u8),

    /// A record read back from storage failed its checksum.
    #[error("checksum mismatch: {0}")]
    ChecksumMismatch(RecordKind),

    /// Profile index is not below the configured profile count.
    #[error("profile {0} out of range")]
    ProfileOutOfRange(u8),

    /// The removable medium initialized fine but a later file operation failed.
    #[error("removable media error")]
    MediaError,
}
