use std::fmt;

use anyhow::{ensure, Result};
use itertools::Itertools;
use serde::Serialize;

use super::aligners::constants::{AlignmentMode, Step};
use crate::matrix::{Score, ScoringMatrix, Symbol, GAP};

/// An alignment of `a` against `b`: the steps taken, in the order `a` is consumed, and their
/// score.
///
/// `start` holds the 0-based offsets into `a` and `b` of the first step.  A global alignment
/// always starts at `(0, 0)` and spans both sequences.  A local alignment that found nothing
/// scoring above zero has no steps and no start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    pub mode: AlignmentMode,

    /// The score of the steps under the matrix used to align.
    pub score: Score,

    /// The alignment operations.
    pub steps: Vec<Step>,

    /// Start offsets (0-based) of the alignment in `a` and `b`.
    pub start: Option<(usize, usize)>,

    /// Length of `a` (the whole sequence, not the aligned span).
    pub a_len: usize,

    /// Length of `b` (the whole sequence, not the aligned span).
    pub b_len: usize,
}

impl Alignment {
    pub fn new(
        mode: AlignmentMode,
        score: Score,
        steps: Vec<Step>,
        start: Option<(usize, usize)>,
        a_len: usize,
        b_len: usize,
    ) -> Self {
        Self {
            mode,
            score,
            steps,
            start,
            a_len,
            b_len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn a_start(&self) -> Option<usize> {
        self.start.map(|(a_start, _)| a_start)
    }

    pub fn b_start(&self) -> Option<usize> {
        self.start.map(|(_, b_start)| b_start)
    }

    /// End offset (0-based exclusive) of the alignment in `a`.
    pub fn a_end(&self) -> Option<usize> {
        self.a_start()
            .map(|start| start + self.steps.iter().map(|s| s.length_on_a()).sum::<usize>())
    }

    /// End offset (0-based exclusive) of the alignment in `b`.
    pub fn b_end(&self) -> Option<usize> {
        self.b_start()
            .map(|start| start + self.steps.iter().map(|s| s.length_on_b()).sum::<usize>())
    }

    /// The run-length encoded steps, e.g. `3M1D2M`.  Empty when there are no steps.
    pub fn cigar(&self) -> String {
        self.steps
            .iter()
            .dedup_with_count()
            .map(|(count, step)| format!("{}{}", count, step.as_char()))
            .collect()
    }

    /// Renders the aligned spans of `a` and `b` as three lines: `a` with `-` for insertions,
    /// a middle line with `|` between identical symbols, and `b` with `-` for deletions.
    ///
    /// `a` and `b` must be the sequences that were aligned.
    pub fn render(&self, a: &[Symbol], b: &[Symbol]) -> String {
        let (mut i, mut j) = self.start.unwrap_or_default();
        let mut top = String::with_capacity(self.steps.len());
        let mut middle = String::with_capacity(self.steps.len());
        let mut bottom = String::with_capacity(self.steps.len());
        for step in &self.steps {
            match step {
                Step::Match => {
                    top.push(char::from(a[i]));
                    middle.push(if a[i] == b[j] { '|' } else { ' ' });
                    bottom.push(char::from(b[j]));
                }
                Step::Deletion => {
                    top.push(char::from(a[i]));
                    middle.push(' ');
                    bottom.push('-');
                }
                Step::Insertion => {
                    top.push('-');
                    middle.push(' ');
                    bottom.push(char::from(b[j]));
                }
            }
            i += step.length_on_a();
            j += step.length_on_b();
        }
        format!("{top}\n{middle}\n{bottom}")
    }

    /// Scores the steps against `a` and `b` from scratch: every step scores its pair, and each
    /// maximal run of deletions or of insertions pays the gap open once.
    pub fn rescore(&self, a: &[Symbol], b: &[Symbol], matrix: &ScoringMatrix) -> Result<Score> {
        let (mut i, mut j) = self.start.unwrap_or_default();
        ensure!(
            self.a_end().unwrap_or(i) <= a.len() && self.b_end().unwrap_or(j) <= b.len(),
            "Alignment ({}) does not fit sequences of length {} and {}",
            self,
            a.len(),
            b.len()
        );
        let mut score = 0.0;
        let mut prev: Option<Step> = None;
        for &step in &self.steps {
            score += match step {
                Step::Match => matrix.get(a[i], b[j])?,
                Step::Deletion => matrix.get(a[i], GAP)?,
                Step::Insertion => matrix.get(GAP, b[j])?,
            };
            if step.is_gap() && prev != Some(step) {
                score += matrix.get(GAP, GAP)?;
            }
            i += step.length_on_a();
            j += step.length_on_b();
            prev = Some(step);
        }
        Ok(score)
    }

    /// Panics unless the spans fit the sequence lengths, and for a global alignment, span both
    /// sequences entirely.
    pub fn validate(&self) {
        match self.start {
            None => {
                assert_eq!(self.mode, AlignmentMode::Local, "only local alignments lack a start");
                assert!(self.steps.is_empty(), "steps without a start");
                assert_eq!(self.score, 0.0, "score without a start");
            }
            Some(start) => {
                let a_end = self.a_end().unwrap_or(start.0);
                let b_end = self.b_end().unwrap_or(start.1);
                assert!(a_end <= self.a_len, "a_end");
                assert!(b_end <= self.b_len, "b_end");
                if self.mode == AlignmentMode::Global {
                    assert_eq!(start, (0, 0), "start");
                    assert_eq!(a_end, self.a_len, "a_end");
                    assert_eq!(b_end, self.b_len, "b_end");
                }
            }
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = |start: Option<usize>, end: Option<usize>, len: usize| match (start, end) {
            (Some(start), Some(end)) => format!("{start}-{end}/{len}"),
            _ => format!("*/{len}"),
        };
        write!(
            f,
            "mode: {} a-span: {} b-span: {} score: {} cigar: {}",
            self.mode,
            span(self.a_start(), self.a_end(), self.a_len),
            span(self.b_start(), self.b_end(), self.b_len),
            self.score,
            if self.is_empty() { "*".to_string() } else { self.cigar() },
        )
    }
}
