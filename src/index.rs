//! In-memory index storage.
//!
//! - [`inverted::InvertedIndex`] - postings with frequencies and payloads,
//!   per-document metadata and the term dictionary
//! - [`store::IndexStore`] - named indexes with an open/closed lifecycle
//! - [`payload`] - the boost and score payload attached to every posting
//! - [`spatial`] - points, distances and the tier/cell grid

pub mod inverted;
pub mod payload;
pub mod spatial;
pub mod store;

pub use inverted::{DocNumber, FieldTerms, IndexEntry, IndexStats, IndexedDocument, InvertedIndex};
pub use spatial::{DistanceUnit, GeoPoint};
pub use store::{IndexHandle, IndexStore};
