//! Built-in collections
//!
//! [`catalog`] declares the schemas of the collections the server knows how
//! to host; [`seeds`] holds demo payloads for some of them.

pub mod catalog;
pub mod seeds;

pub use catalog::builtin;
