//! SeaORM entity definitions for PostgreSQL database.

pub mod commit;
pub mod commit_file;
pub mod repo;
pub mod user;
