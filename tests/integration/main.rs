//! blobcache integration test harness.
//!
//! `scenarios` exercises the library crates directly (in-process) against
//! the literal invariants and end-to-end scenarios this workspace commits
//! to. `daemon` drives the real `blobcached`/`blobcache-ctl` binaries as
//! subprocesses; it is skipped automatically when the binaries haven't
//! been built yet.

mod daemon;
mod infra;
mod scenarios;
