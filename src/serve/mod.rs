//! Static file serving
//!
//! Turns request targets into paths under the configured root and answers
//! them from the file cache.

pub mod handler;
pub mod resolve;

pub use handler::StaticFiles;
