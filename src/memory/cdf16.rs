//! CDF16: adaptive context-conditioned cumulative distribution over bytes.
//!
//! The model is a tree of context nodes. Each node owns a 257-entry
//! cumulative table on a fixed-point scale of 2^13 (`table[0] = 0`,
//! `table[256] = SCALE`, non-decreasing) that estimates the distribution of
//! the next byte given the path of recent bytes leading to the node.
//!
//! # History ring
//!
//! The last D bytes live in a ring of depth D. The write cursor always points
//! at the oldest entry; pushing stores the byte at the cursor and then
//! advances it (store-then-advance). Context chains are walked from the
//! cursor, i.e. oldest byte first. After [`Cdf16::reset_context`] the ring
//! holds D zero bytes.
//!
//! # Learning
//!
//! Updating with symbol `s` nudges every table on the chain root..leaf
//! toward a "mixin" table that puts almost all mass on `s`:
//!
//! ```text
//! table[i] += (mixin[s][i] - table[i]) >> R
//! ```
//!
//! With R = 5 each update moves a table 1/32 of the way. Both endpoints are
//! fixed and every mixin table has strictly positive per-symbol mass, so the
//! update keeps each table strictly increasing: no symbol ever reaches zero
//! probability.
//!
//! # Scoring
//!
//! The code length of `s` under a table is `FIXED - log2(table[s+1] - table[s])`
//! bits, i.e. `-log2 P(s)`.

use crate::error::{AnomalyError, Result};
use std::sync::OnceLock;

/// Fixed-point precision in bits.
pub const FIXED: u32 = 13;
/// Fixed-point scale, the value of `table[256]`.
pub const SCALE: u16 = 1 << FIXED;
/// Alphabet size.
pub const SYMBOLS: usize = 256;
/// Default update rate R.
pub const DEFAULT_RATE: u32 = 5;
/// Default context depth D.
pub const DEFAULT_DEPTH: usize = 1;

/// A 257-entry cumulative table.
pub type CumulativeTable = [u16; SYMBOLS + 1];

const NO_CHILD: u32 = 0;

fn uniform_table() -> CumulativeTable {
    let step = SCALE / SYMBOLS as u16;
    let mut table = [0u16; SYMBOLS + 1];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = i as u16 * step;
    }
    table
}

/// Per-symbol target tables, shared by every model.
fn mixin_tables() -> &'static [CumulativeTable] {
    static MIXIN: OnceLock<Vec<CumulativeTable>> = OnceLock::new();
    MIXIN.get_or_init(|| {
        (0..SYMBOLS)
            .map(|symbol| {
                let mut table = [0u16; SYMBOLS + 1];
                let mut sum = 0u32;
                for (j, entry) in table.iter_mut().enumerate() {
                    *entry = sum as u16;
                    sum += 1;
                    if j == symbol {
                        sum += SCALE as u32 - SYMBOLS as u32;
                    }
                }
                table
            })
            .collect()
    })
}

struct ContextNode {
    model: CumulativeTable,
    /// Arena indices of children keyed by symbol; `NO_CHILD` when absent.
    children: Option<Box<[u32; SYMBOLS]>>,
}

impl ContextNode {
    fn new() -> Self {
        Self {
            model: uniform_table(),
            children: None,
        }
    }

    fn child(&self, symbol: u8) -> Option<usize> {
        let children = self.children.as_ref()?;
        match children[symbol as usize] {
            NO_CHILD => None,
            index => Some(index as usize),
        }
    }
}

/// Adaptive context-mixing byte model.
///
/// Holds mutable learning state; a model belongs to one scoring session.
pub struct Cdf16 {
    /// Arena of context nodes; index 0 is the root.
    nodes: Vec<ContextNode>,
    context: Vec<u8>,
    first: usize,
    rate: u32,
}

impl Cdf16 {
    /// Create a model with context depth `depth` and update rate `rate`.
    ///
    /// # Errors
    /// `InvalidConfig` if `depth` is zero or `rate` is outside `1..=FIXED`.
    pub fn new(depth: usize, rate: u32) -> Result<Self> {
        if depth == 0 {
            return Err(AnomalyError::InvalidConfig(
                "context depth must be at least 1".to_string(),
            ));
        }
        if !(1..=FIXED).contains(&rate) {
            return Err(AnomalyError::InvalidConfig(format!(
                "decay rate must be in 1..={}, got {}",
                FIXED, rate
            )));
        }
        Ok(Self {
            nodes: vec![ContextNode::new()],
            context: vec![0; depth],
            first: 0,
            rate,
        })
    }

    /// Context depth D.
    pub fn depth(&self) -> usize {
        self.context.len()
    }

    /// Update rate R.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Number of context nodes grown so far, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The most recent D bytes, oldest first.
    pub fn history(&self) -> Vec<u8> {
        let depth = self.depth();
        (0..depth)
            .map(|i| self.context[(self.first + i) % depth])
            .collect()
    }

    /// Cumulative table for the current context.
    ///
    /// Follows the history ring from the root; if a child is missing, the
    /// deepest existing ancestor's table is used instead.
    pub fn model(&self) -> &CumulativeTable {
        let depth = self.depth();
        let mut node = 0;
        let mut current = self.first;
        for _ in 0..depth {
            match self.nodes[node].child(self.context[current]) {
                Some(child) => node = child,
                None => break,
            }
            current = (current + 1) % depth;
        }
        &self.nodes[node].model
    }

    /// Bits needed to code `symbol` in the current context.
    pub fn code_length(&self, symbol: u8) -> f32 {
        let table = self.model();
        let s = symbol as usize;
        let mass = table[s + 1].saturating_sub(table[s]).max(1);
        FIXED as f32 - (mass as f32).log2()
    }

    /// Learn `symbol` in the current context, then push it into the history.
    ///
    /// Missing nodes on the context chain are created as needed.
    pub fn update(&mut self, symbol: u8) {
        let mixin = &mixin_tables()[symbol as usize];
        let depth = self.depth();
        let mut node = 0;
        let mut current = self.first;
        for level in 0..=depth {
            adapt(&mut self.nodes[node].model, mixin, self.rate);
            if level == depth {
                break;
            }
            node = self.child_or_insert(node, self.context[current]);
            current = (current + 1) % depth;
        }
        self.push_context(symbol);
    }

    /// Push `symbol` into the history without learning.
    pub fn push_context(&mut self, symbol: u8) {
        self.context[self.first] = symbol;
        self.first = (self.first + 1) % self.depth();
    }

    /// Forget the current position in history. Learned tables are kept.
    pub fn reset_context(&mut self) {
        self.context.fill(0);
        self.first = 0;
    }

    /// Average bits per symbol of `input`, learning as it goes.
    ///
    /// Resets the history afterwards. Empty input scores 0.
    pub fn train(&mut self, input: &[u8]) -> f32 {
        let mut total = 0.0f64;
        for &symbol in input {
            total += self.code_length(symbol) as f64;
            self.update(symbol);
        }
        self.reset_context();
        average(total, input.len())
    }

    /// Average bits per symbol of `input` without learning.
    ///
    /// The history still advances through `input` and is reset afterwards.
    pub fn score(&mut self, input: &[u8]) -> f32 {
        let mut total = 0.0f64;
        for &symbol in input {
            total += self.code_length(symbol) as f64;
            self.push_context(symbol);
        }
        self.reset_context();
        average(total, input.len())
    }

    /// Every table in the tree, root first.
    pub fn tables(&self) -> impl Iterator<Item = &CumulativeTable> {
        self.nodes.iter().map(|n| &n.model)
    }

    fn child_or_insert(&mut self, parent: usize, symbol: u8) -> usize {
        if let Some(child) = self.nodes[parent].child(symbol) {
            return child;
        }
        let index = self.nodes.len();
        self.nodes.push(ContextNode::new());
        let children = self.nodes[parent]
            .children
            .get_or_insert_with(|| Box::new([NO_CHILD; SYMBOLS]));
        children[symbol as usize] = index as u32;
        index
    }
}

impl Default for Cdf16 {
    fn default() -> Self {
        Self {
            nodes: vec![ContextNode::new()],
            context: vec![0; DEFAULT_DEPTH],
            first: 0,
            rate: DEFAULT_RATE,
        }
    }
}

impl std::fmt::Debug for Cdf16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cdf16")
            .field("depth", &self.depth())
            .field("rate", &self.rate)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Move the interior of `model` toward `mixin` by 2^-rate.
#[inline]
fn adapt(model: &mut CumulativeTable, mixin: &CumulativeTable, rate: u32) {
    for i in 1..SYMBOLS {
        let a = model[i] as i32;
        let b = mixin[i] as i32;
        model[i] = (a + ((b - a) >> rate)) as u16;
    }
}

fn average(total: f64, len: usize) -> f32 {
    if len == 0 {
        return 0.0;
    }
    (total / len as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_valid(table: &CumulativeTable) {
        assert_eq!(table[0], 0);
        assert_eq!(table[SYMBOLS], SCALE);
        for i in 0..SYMBOLS {
            assert!(
                table[i] < table[i + 1],
                "table not increasing at {}: {} >= {}",
                i,
                table[i],
                table[i + 1]
            );
        }
    }

    #[test]
    fn test_mixin_tables() {
        for (symbol, table) in mixin_tables().iter().enumerate() {
            assert_valid(table);
            assert_eq!(
                table[symbol + 1] - table[symbol],
                SCALE - SYMBOLS as u16 + 1
            );
        }
    }

    #[test]
    fn test_uniform_start() {
        let model = Cdf16::default();
        assert_valid(model.model());
        assert!((model.code_length(b'x') - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid_params() {
        assert!(matches!(Cdf16::new(0, 5), Err(AnomalyError::InvalidConfig(_))));
        assert!(matches!(Cdf16::new(1, 0), Err(AnomalyError::InvalidConfig(_))));
        assert!(matches!(Cdf16::new(1, 14), Err(AnomalyError::InvalidConfig(_))));
        assert!(Cdf16::new(3, 13).is_ok());
    }

    #[test]
    fn test_ring_store_then_advance() {
        let mut model = Cdf16::new(3, 5).unwrap();
        model.push_context(1);
        assert_eq!(model.history(), vec![0, 0, 1]);
        model.push_context(2);
        model.push_context(3);
        assert_eq!(model.history(), vec![1, 2, 3]);
        model.push_context(4);
        assert_eq!(model.history(), vec![2, 3, 4]);
        model.reset_context();
        assert_eq!(model.history(), vec![0, 0, 0]);
    }

    #[test]
    fn test_lazy_growth() {
        let mut model = Cdf16::new(2, 5).unwrap();
        assert_eq!(model.node_count(), 1);
        model.update(b'a');
        // Chain root -> [0] -> [0, 0] grown on first update.
        assert_eq!(model.node_count(), 3);
        model.update(b'a');
        // History is now [0, 'a']: one new node under the existing [0] child.
        assert_eq!(model.node_count(), 4);
    }

    #[test]
    fn test_falls_back_to_ancestor() {
        let mut model = Cdf16::new(1, 5).unwrap();
        model.update(b'a');
        // History is ['a'], which has no child yet: the root table answers.
        assert_eq!(model.history(), vec![b'a']);
        assert!(std::ptr::eq(model.model(), &model.nodes[0].model));
    }

    #[test]
    fn test_learns_repeated_symbol() {
        let mut model = Cdf16::default();
        let before = model.code_length(b'a');
        for _ in 0..64 {
            model.update(b'a');
        }
        model.reset_context();
        let after = model.code_length(b'a');
        assert!(after < before, "{} should be < {}", after, before);
        for table in model.tables() {
            assert_valid(table);
        }
    }

    #[test]
    fn test_second_pass_scores_lower() {
        let input = vec![0x61u8; 64];
        let mut model = Cdf16::default();
        let first = model.train(&input);
        let second = model.train(&input);
        assert!(second <= first, "{} should be <= {}", second, first);
        assert!(first > 0.0);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let mut model = Cdf16::default();
        assert_eq!(model.train(&[]), 0.0);
        assert_eq!(model.score(&[]), 0.0);
        assert_eq!(model.node_count(), 1);
    }

    #[test]
    fn test_score_does_not_learn() {
        let input = b"{\"a\":[{\"a\":\"aa\"}]}";
        let mut model = Cdf16::new(2, 5).unwrap();
        let first = model.score(input);
        let second = model.score(input);
        assert_eq!(first, second);
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.history(), vec![0, 0]);
    }

    #[test]
    fn test_train_resets_history() {
        let mut model = Cdf16::new(2, 5).unwrap();
        model.train(b"xyz");
        assert_eq!(model.history(), vec![0, 0]);
    }

    proptest! {
        #[test]
        fn prop_tables_stay_monotonic(
            input in prop::collection::vec(any::<u8>(), 0..512),
            depth in 1usize..4,
            rate in 1u32..=FIXED,
        ) {
            let mut model = Cdf16::new(depth, rate).unwrap();
            model.train(&input);
            model.train(&input);
            for table in model.tables() {
                prop_assert_eq!(table[0], 0);
                prop_assert_eq!(table[SYMBOLS], SCALE);
                for i in 0..SYMBOLS {
                    prop_assert!(table[i] < table[i + 1]);
                }
            }
        }
    }
}
