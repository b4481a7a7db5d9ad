//! Flat vector index, its on-disk format, and the offline writer / serving loader.

pub mod flat;
pub mod schema;
pub mod store;
pub mod writer;

pub use flat::FlatIndex;
pub use schema::Manifest;
pub use store::IndexStore;
pub use writer::IndexWriter;
