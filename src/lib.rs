//! fileserve - Caching static file server
//!
//! Serves files from a root directory over HTTP/1.1, keeping their contents
//! in memory and refreshing them when their modification time changes.

pub mod cache;
pub mod cli;
pub mod config;
pub mod http;
pub mod serve;
pub mod server;
