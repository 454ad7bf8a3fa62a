//! DevScan server library.
//!
//! GitHub sign-in, repository and commit mirroring, and a relay to the
//! AI code-analysis service.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
