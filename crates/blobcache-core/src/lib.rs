//! Shared types for the blobcache workspace: the content key, the streaming
//! digest, the job-id stand-in, the error taxonomy, wire-level constants,
//! and the layered config reader.

pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod jobid;
pub mod key;

pub use config::BlobCacheConfig;
pub use constants::*;
pub use digest::{digest_bytes, StreamingDigest};
pub use error::{Error, Result};
pub use jobid::JobId;
pub use key::BlobKey;
