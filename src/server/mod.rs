//! Server module for building HTTP servers with auto-registered routes
//!
//! This module provides a `ServerBuilder` that serves every registered
//! collection under `/api/{collection}` with the same handlers; the
//! collection's schema decides what each request may filter, search and
//! sort on.

pub mod builder;
pub mod handlers;
pub mod params;
pub mod registry;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
pub use params::ListParams;
pub use registry::CollectionRegistry;
