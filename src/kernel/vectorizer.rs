//! Vectorizer: random projection of nested documents.
//!
//! A document is reduced to the set of its *context paths*: for every scalar
//! leaf, the chain of object keys from the root down to it followed by the
//! scalar's canonical string. Every suffix of every context path selects a
//! column of a (virtual) sparse ternary matrix, and the embedding is the sum
//! of all selected columns.
//!
//! ```text
//! {"a": [{"b": "x"}]}   →   path ["a", "b", "x"]
//!                       →   column(["a","b","x"]) + column(["b","x"]) + column(["x"])
//! ```
//!
//! Because a leaf contributes at every distance from the root, documents that
//! share trailing key/value sequences overlap partially even when their full
//! paths differ. Because contributions are summed, the iteration order of
//! object keys and array elements never changes the result.
//!
//! Columns are a pure function of the path hash, so the cache is only a
//! speed-up: enabled or not, the embedding is bit-identical.

use crate::config::Config;
use crate::error::{AnomalyError, Result};
use crate::kernel::document::{malformed, Node, Walkable};
use crate::kernel::embedding::Embedding;
use crate::kernel::source::{ProjectionSource, SourceKind};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;
/// Mixed in after every path element. Never occurs in UTF-8 text.
const ELEMENT_SEPARATOR: u8 = 0xFF;

/// 64-bit FNV-1a hash of a context path.
///
/// Order-sensitive, and element boundaries are part of the hash, so
/// `["ab", "c"]` and `["a", "bc"]` select different columns.
pub fn path_hash<S: AsRef<str>>(path: &[S]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for element in path {
        for &byte in element.as_ref().as_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash ^= ELEMENT_SEPARATOR as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

type ColumnCache = RwLock<HashMap<u64, Arc<[i8]>>>;

/// Embeds documents into a fixed-dimensional integer space.
///
/// Clones share one column cache, so a vectorizer can be handed to many
/// worker threads. The cache is append-only and lives as long as the last
/// clone.
#[derive(Clone)]
pub struct Vectorizer {
    dimensions: usize,
    source: SourceKind,
    cache: Option<Arc<ColumnCache>>,
}

impl Vectorizer {
    /// Create a caching LFSR-backed vectorizer.
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::with_params(dimensions, true, SourceKind::Lfsr)
    }

    /// Create a vectorizer with explicit parameters.
    ///
    /// # Errors
    /// `InvalidConfig` if `dimensions` is zero.
    pub fn with_params(dimensions: usize, cache: bool, source: SourceKind) -> Result<Self> {
        if dimensions == 0 {
            return Err(AnomalyError::InvalidConfig(
                "vectorizer dimensions must be at least 1".to_string(),
            ));
        }
        debug!(dimensions, cache, ?source, "creating vectorizer");
        Ok(Self {
            dimensions,
            source,
            cache: cache.then(|| Arc::new(RwLock::new(HashMap::new()))),
        })
    }

    /// Create a vectorizer from a validated [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_params(config.dimensions, config.cache, config.source)
    }

    /// Get the dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get the projection source kind.
    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// Whether projection columns are cached.
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Get the number of cached columns (0 when caching is disabled).
    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.read().len())
    }

    /// Embed a document.
    ///
    /// # Errors
    /// `MalformedDocument` if the walk reaches a node that is neither an
    /// object, an array nor a scalar.
    pub fn vectorize<W: Walkable + ?Sized>(&self, document: &W) -> Result<Embedding> {
        let mut embedding = Embedding::zeros(self.dimensions);
        let mut context = Vec::new();
        self.walk(document, &mut context, &mut embedding)?;
        Ok(embedding)
    }

    /// Parse JSON text and embed it.
    pub fn vectorize_json(&self, json: &str) -> Result<Embedding> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        self.vectorize(&value)
    }

    /// Get the projection column for a context path.
    ///
    /// With caching enabled the column is looked up (and stored on a miss);
    /// otherwise it is regenerated from the path hash.
    pub fn column<S: AsRef<str>>(&self, path: &[S]) -> Arc<[i8]> {
        let hash = path_hash(path);
        match &self.cache {
            Some(cache) => self.cached_column(cache, hash),
            None => self.generate_column(hash),
        }
    }

    fn walk<'d, W: Walkable + ?Sized>(
        &self,
        node: &'d W,
        context: &mut Vec<&'d str>,
        embedding: &mut Embedding,
    ) -> Result<()> {
        match node.node() {
            Node::Object(pairs) => {
                for (key, value) in pairs {
                    context.push(key);
                    self.walk(value, context, embedding)?;
                    context.pop();
                }
            }
            Node::Array(items) => {
                for item in items {
                    self.walk(item, context, embedding)?;
                }
            }
            Node::Scalar(scalar) => {
                let mut path: Vec<&str> = Vec::with_capacity(context.len() + 1);
                path.extend_from_slice(&context[..]);
                path.push(&*scalar);
                for i in 0..path.len() {
                    self.contribute(&path[i..], embedding);
                }
            }
            Node::Unsupported(found) => return Err(malformed(context.as_slice(), found)),
        }
        Ok(())
    }

    /// Add the column selected by `path` into `embedding`.
    fn contribute(&self, path: &[&str], embedding: &mut Embedding) {
        let hash = path_hash(path);
        match &self.cache {
            Some(cache) => embedding.add_column(&self.cached_column(cache, hash)),
            None => {
                let mut source = self.source.generate(hash);
                for v in embedding.data_mut() {
                    *v += source.next_ternary() as i64;
                }
            }
        }
    }

    fn cached_column(&self, cache: &ColumnCache, hash: u64) -> Arc<[i8]> {
        if let Some(column) = cache.read().get(&hash) {
            return Arc::clone(column);
        }

        // Generated outside the lock; a racing writer may win, in which case
        // its (identical) column is kept.
        let column = self.generate_column(hash);
        trace!(hash, "projection column cache miss");
        let mut cache = cache.write();
        Arc::clone(cache.entry(hash).or_insert(column))
    }

    fn generate_column(&self, hash: u64) -> Arc<[i8]> {
        let mut column = vec![0i8; self.dimensions];
        self.source.generate(hash).fill(&mut column);
        column.into()
    }
}

impl std::fmt::Debug for Vectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vectorizer")
            .field("dimensions", &self.dimensions)
            .field("source", &self.source)
            .field("cache_size", &self.cache_size())
            .finish()
    }
}
