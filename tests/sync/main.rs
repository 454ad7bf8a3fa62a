//! Sync service test suite.
//!
//! Runs repository, commit history and commit file sync against an
//! in-memory store and a scripted GitHub source. No database or network
//! access is needed.
//!
//! Run with: cargo test --test sync

mod memory_store;

mod test_commit_sync;
