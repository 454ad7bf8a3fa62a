//! Session authentication for API routes.

mod extractor;

pub use extractor::SessionUser;
