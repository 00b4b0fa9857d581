//! Ranked retrieval over indexed documents.
//!
//! - [`criteria`] - what to look for: keywords, filters, spatial circle,
//!   recency decay, score-only and match-all modes
//! - [`similarity`] - how matching terms are weighted
//! - [`decay`] - age-based score attenuation
//! - [`engine`] - execution, ordering, pagination, lookups and suggestions

pub mod criteria;
pub mod decay;
pub mod engine;
pub mod results;
pub mod similarity;

pub use criteria::{QueryCriteria, SpatialFilter};
pub use decay::RecencyDecay;
pub use engine::{DEFAULT_MAX_LIMIT, QueryEngine, SearchConfig, score_factor};
pub use results::{SearchDoc, SearchResults};
pub use similarity::{ClassicSimilarity, Similarity};
