//! Document model.
//!
//! A [`Document`](document::Document) is an immutable, keyed attribute bag: it
//! always names its owning database, usually carries an id, and may carry a
//! revision token used for optimistic concurrency by the document repository.
//! Attribute values are [`Value`](value::Value)s: strings, numbers, booleans,
//! nested maps or lists.
//!
//! # Examples
//!
//! ```
//! use fathom::document::document::Document;
//!
//! let doc = Document::builder()
//!     .database("books")
//!     .id("b1")
//!     .put("title", "Rust in Action").unwrap()
//!     .put("year", 2021).unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(doc.get_str("title"), Some("Rust in Action"));
//! assert_eq!(doc.len(), 2);
//! ```

pub mod document;
pub mod value;

pub use document::{Document, DocumentBuilder};
pub use value::Value;
