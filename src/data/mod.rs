//! Data ingestion and storage
//!
//! CSV loading, match normalization, table export and the SQLite snapshot.

pub mod database;
pub mod export;
pub mod loader;
pub mod normalize;

pub use database::Database;
pub use loader::RawTable;
pub use normalize::{
    normalize_table, FixtureNormalizer, IngestReport, Normalizer, PerspectiveNormalizer,
    RowFilter, Shape,
};
