use anyhow::Result;

use super::{constants::AlignmentMode, fill_table};
use crate::{
    align::{alignment::Alignment, traceback::traceback},
    matrix::{ScoringMatrix, Symbol},
};

/// Computes an optimal global (Needleman-Wunsch) alignment of all of `a` against all of `b`.
///
/// The table is filled with the affine recurrence in [`fill_table`]: the gap-open score,
/// `(GAP, GAP)`, is charged once at the start of each run of deletions or insertions, and every
/// gapped symbol also scores its `(x, GAP)` or `(GAP, y)` entry.  Ties prefer a match, then a
/// deletion, then an insertion.
///
/// Errors if `matrix` lacks a pair that the alignment may need.  When both sequences are empty
/// the alignment is empty and scores zero without consulting the matrix.
///
/// # Example
///
/// ```rust
/// use duet::align::{global, Step::{Deletion, Match}};
/// use duet::matrix::predefined::LEVENSHTEIN;
///
/// let alignment = global(b"aba", b"aa", &LEVENSHTEIN).unwrap();
/// assert_eq!(alignment.steps, vec![Match, Deletion, Match]);
/// assert_eq!(alignment.score, -1.0);
/// ```
pub fn global(a: &[Symbol], b: &[Symbol], matrix: &ScoringMatrix) -> Result<Alignment> {
    let (m, n) = (a.len(), b.len());
    if m == 0 && n == 0 {
        return Ok(Alignment::new(
            AlignmentMode::Global,
            0.0,
            Vec::new(),
            Some((0, 0)),
            0,
            0,
        ));
    }
    matrix.check_covers(a, b)?;

    let table = fill_table(a, b, matrix, false);
    let score = table.get(m, n).score;
    let path = traceback(&table, m, n, |i, j, _| i == 0 && j == 0);

    Ok(Alignment::new(
        AlignmentMode::Global,
        score,
        path.steps,
        Some((0, 0)),
        m,
        n,
    ))
}
