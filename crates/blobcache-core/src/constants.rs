//! Wire-level and storage-level constants.
//!
//! These are part of the protocol: changing any of them breaks compatibility
//! between a `blobcached` server and any client or proxy built against this
//! crate.

/// Width in bytes of a [`crate::BlobKey`].
pub const BLOBKEY_SIZE: usize = 20;

/// Width in bytes of a [`crate::JobId`].
///
/// The real job-manager identifier type lives outside this workspace; this
/// is a fixed-width stand-in used for the wire-level JobID frame.
pub const JOBID_SIZE: usize = 16;

/// Maximum payload carried by a single length-prefixed put chunk.
pub const TRANSFER_BUFFER_SIZE: usize = 4096;

/// Op byte: the connection carries a put.
pub const OP_PUT: u8 = 0x00;

/// Op byte: the connection carries a get.
pub const OP_GET: u8 = 0x01;

/// Get-response status byte: the key was not found.
pub const STATUS_MISS: u8 = 0x00;

/// Get-response status byte: the key was found, payload follows.
pub const STATUS_HIT: u8 = 0x01;

/// JobID frame marker: no job id follows.
pub const JOBID_ABSENT: u8 = 0x00;

/// JobID frame marker: exactly `JOBID_SIZE` bytes follow.
pub const JOBID_PRESENT: u8 = 0x01;

/// Terminator value for the put chunk length prefix.
pub const CHUNK_TERMINATOR: i32 = -1;

/// Filename prefix for promoted (final) blobs.
pub const BLOB_PREFIX: &str = "blob_";

/// Filename prefix for temp files awaiting promotion.
pub const TEMP_PREFIX: &str = "tmp-";

/// Upper bound (exclusive) for the random temp-file suffix.
pub const TEMP_NAME_SPACE: u32 = 10_000;
