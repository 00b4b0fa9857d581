//! Platform settings and policy storage.
//!
//! [`PlatformConfig`] is the file-level configuration a platform is built
//! from. [`ConfigurationRepository`] keeps index, query and lookup policies in
//! the document repository behind per-kind caches, and [`load_or_bootstrap`]
//! seeds a repository from JSON files on first start.

pub mod bootstrap;
pub mod repository;
pub mod settings;

pub use bootstrap::load_or_bootstrap;
pub use repository::ConfigurationRepository;
pub use settings::PlatformConfig;
