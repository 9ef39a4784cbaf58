//! Streaming SHA-1, used producer-side while writing and verifier-side while
//! reading. Never buffer a whole blob just to hash it.

use sha1::{Digest as _, Sha1};

use crate::key::BlobKey;

/// An incremental SHA-1 hasher that finalizes into a [`BlobKey`].
#[derive(Default)]
pub struct StreamingDigest {
    inner: Sha1,
}

impl StreamingDigest {
    /// Start a fresh digest.
    pub fn new() -> Self {
        Self { inner: Sha1::new() }
    }

    /// Feed more bytes into the running hash.
    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Consume the digest and produce the resulting key.
    pub fn finalize(self) -> BlobKey {
        let out = self.inner.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(out.as_slice());
        BlobKey::from_bytes(bytes)
    }
}

/// One-shot SHA-1 over a full buffer, for tests and small-payload call sites.
pub fn digest_bytes(bytes: &[u8]) -> BlobKey {
    let mut d = StreamingDigest::new();
    d.update(bytes);
    d.finalize()
}
