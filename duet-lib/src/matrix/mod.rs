//! Scoring matrices over 8-bit symbols.
//!
//! A [`ScoringMatrix`] maps an ordered pair of symbols to a score that the aligners maximize.
//! The symbol [`GAP`] is reserved: `(x, GAP)` and `(GAP, y)` score a symbol aligned against a
//! gap (charged for every position of a gap run), while `(GAP, GAP)` holds the gap-open cost,
//! charged once when a run of gaps begins.
pub mod ncbi;
pub mod predefined;

use anyhow::{anyhow, bail, ensure, Result};
use std::collections::BTreeMap;

/// A single element of an alignment alphabet.
pub type Symbol = u8;

/// Scores are real valued; integral scores are the common case.
pub type Score = f64;

/// The sentinel symbol for "no character" in an alignment column.
pub const GAP: Symbol = u8::MAX;

/// The number of distinct symbols, including the gap.
const NUM_SYMBOLS: usize = 1 << 8;

#[inline(always)]
fn offset(x: Symbol, y: Symbol) -> usize {
    (x as usize) * NUM_SYMBOLS + (y as usize)
}

/// Formats a symbol for error messages.
pub(crate) fn display_symbol(symbol: Symbol) -> String {
    if symbol == GAP {
        "<gap>".to_string()
    } else if symbol.is_ascii_graphic() {
        format!("'{}'", symbol as char)
    } else {
        format!("0x{symbol:02x}")
    }
}

/// An immutable mapping from ordered symbol pairs to scores.
///
/// The pairs are kept in a sorted map, and also compiled into a dense 256x256 table so that the
/// dynamic programming never hashes or searches.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringMatrix {
    pairs: BTreeMap<(Symbol, Symbol), Score>,
    dense: Vec<Option<Score>>,
}

impl ScoringMatrix {
    /// Builds a matrix from `((x, y), score)` entries.  A pair given more than once keeps its last
    /// score.
    pub fn new<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = ((Symbol, Symbol), Score)>,
    {
        let pairs: BTreeMap<(Symbol, Symbol), Score> = pairs.into_iter().collect();
        let mut dense = vec![None; NUM_SYMBOLS * NUM_SYMBOLS];
        for (&(x, y), &score) in &pairs {
            dense[offset(x, y)] = Some(score);
        }
        Self { pairs, dense }
    }

    /// Returns the score for aligning `x` against `y`, or an error if the pair is absent.
    pub fn get(&self, x: Symbol, y: Symbol) -> Result<Score> {
        self.dense[offset(x, y)].ok_or_else(|| {
            anyhow!(
                "Scoring matrix has no entry for the pair ({}, {})",
                display_symbol(x),
                display_symbol(y)
            )
        })
    }

    /// Looks up a pair already known to be present (see [`ScoringMatrix::check_covers`]).
    #[inline(always)]
    pub(crate) fn lookup(&self, x: Symbol, y: Symbol) -> Score {
        debug_assert!(self.contains(x, y));
        self.dense[offset(x, y)].unwrap_or_default()
    }

    pub fn contains(&self, x: Symbol, y: Symbol) -> bool {
        self.dense[offset(x, y)].is_some()
    }

    /// The number of stored pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates the stored pairs in `(x, y)` order.
    pub fn pairs(&self) -> impl Iterator<Item = ((Symbol, Symbol), Score)> + '_ {
        self.pairs.iter().map(|(&pair, &score)| (pair, score))
    }

    /// The cost charged once per run of gaps, i.e. the `(GAP, GAP)` entry.
    pub fn gap_open(&self) -> Result<Score> {
        self.get(GAP, GAP)
    }

    /// Returns a copy of this matrix with the `(GAP, GAP)` entry set to `gap_open`.
    pub fn with_gap_open(&self, gap_open: Score) -> Self {
        let mut pairs = self.pairs.clone();
        pairs.insert((GAP, GAP), gap_open);
        Self::new(pairs)
    }

    /// Returns a new matrix holding every stored pair and its mirror with the same score.
    ///
    /// Fails if a pair and its mirror are both stored with different scores.
    pub fn symmetrical(&self) -> Result<Self> {
        let mut pairs = BTreeMap::new();
        for (&(x, y), &score) in &self.pairs {
            if let Some(&mirror) = self.pairs.get(&(y, x)) {
                ensure!(
                    mirror == score,
                    "Cannot symmetrize: ({}, {}) scores {} but ({}, {}) scores {}",
                    display_symbol(x),
                    display_symbol(y),
                    score,
                    display_symbol(y),
                    display_symbol(x),
                    mirror
                );
            }
            pairs.insert((x, y), score);
            pairs.insert((y, x), score);
        }
        Ok(Self::new(pairs))
    }

    /// Checks that every pair an alignment of `a` versus `b` can look up is present: each
    /// `(a_i, b_j)`, each `(a_i, GAP)`, each `(GAP, b_j)`, and `(GAP, GAP)`.
    pub fn check_covers(&self, a: &[Symbol], b: &[Symbol]) -> Result<()> {
        let a_symbols = symbols_with_gap(a);
        let b_symbols = symbols_with_gap(b);
        for &x in &a_symbols {
            for &y in &b_symbols {
                if !self.contains(x, y) {
                    bail!(
                        "Scoring matrix has no entry for the pair ({}, {})",
                        display_symbol(x),
                        display_symbol(y)
                    );
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<((Symbol, Symbol), Score)> for ScoringMatrix {
    fn from_iter<T: IntoIterator<Item = ((Symbol, Symbol), Score)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// The distinct symbols of `seq` in ascending order, plus the gap.
fn symbols_with_gap(seq: &[Symbol]) -> Vec<Symbol> {
    let mut seen = [false; NUM_SYMBOLS];
    for &symbol in seq {
        seen[symbol as usize] = true;
    }
    seen[GAP as usize] = true;
    seen.iter()
        .enumerate()
        .filter_map(|(symbol, &present)| present.then_some(symbol as Symbol))
        .collect()
}
