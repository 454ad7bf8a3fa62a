//! Business logic services.

pub mod analysis;
pub mod commit_sync;
pub mod github_api;
pub mod github_oauth;
pub mod repo_sync;

pub use analysis::AnalysisClient;
pub use github_api::{GitHubClient, SourceApi};
pub use github_oauth::configure_routes as configure_auth_routes;
