/// State management module
///
/// This module handles the durable customer location log:
/// - Record types shared with the map layer (data.rs)
/// - SQLite schema, atomic insert and full-set query (repository.rs)

pub mod data;
pub mod repository;

pub use data::{CustomerType, DraftRecord, LocationRecord, RecordId};
pub use repository::LocationRepository;
