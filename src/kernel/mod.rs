//! Kernel layer: stateless, shareable encoding primitives.
//!
//! - Deterministic ternary projection sources ([`Lfsr32`], [`PrngSource`])
//! - Documents and the [`Walkable`] trait
//! - Random-projection embedding ([`Vectorizer`], [`Embedding`])
//! - Similarity metrics ([`Similarity`])
//!
//! Everything here is either immutable or internally synchronized, so a
//! single [`Vectorizer`] can serve many threads. This layer has no
//! dependencies on [`memory`](crate::memory) or
//! [`highlevel`](crate::highlevel).
//!
//! # Example
//!
//! ```rust
//! use anomaly::kernel::{Similarity, Vectorizer};
//!
//! let vectorizer = Vectorizer::new(1024).unwrap();
//! let a = vectorizer.vectorize_json(r#"{"role": "admin"}"#).unwrap();
//! let b = vectorizer.vectorize_json(r#"{"role": "user"}"#).unwrap();
//! let sim = Similarity::cosine(&a.normalized(), &b.normalized());
//! assert!(sim < 1.0);
//! ```

pub mod document;
pub mod embedding;
pub mod similarity;
pub mod source;
pub mod vectorizer;

pub use document::{validate, Document, Node, Walkable};
pub use embedding::Embedding;
pub use similarity::Similarity;
pub use source::{Lfsr32, ProjectionSource, PrngSource, Source, SourceKind};
pub use vectorizer::{path_hash, Vectorizer};
