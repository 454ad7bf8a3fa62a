//! API endpoint modules.

pub mod analysis;
pub mod commits;
pub mod health;
pub mod openapi;
pub mod repos;

pub use commits::configure_routes as configure_commit_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use repos::configure_routes as configure_repo_routes;
