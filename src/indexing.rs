//! Policy-driven indexing.
//!
//! Documents read from a [`DocumentRepository`](crate::repository::DocumentRepository)
//! are flattened field by field ([`flatten`]), analyzed, boosted and located
//! according to their [`IndexPolicy`](crate::policy::IndexPolicy), then
//! written into an index of the [`IndexStore`](crate::index::IndexStore)
//! ([`engine`]).

pub mod engine;
pub mod flatten;

pub use engine::{IndexReport, IndexingConfig, IndexingEngine, JoinSpec};
pub use flatten::field_values;
