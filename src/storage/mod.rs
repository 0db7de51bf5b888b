//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod seed;

pub use in_memory::InMemoryRecordService;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRecordService;
pub use seed::{SeedReport, load_seed_file, seed_records};
