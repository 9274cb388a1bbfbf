use anyhow::Result;
use log::trace;

use super::{constants::AlignmentMode, fill_table};
use crate::{
    align::{alignment::Alignment, traceback::traceback},
    matrix::{ScoringMatrix, Symbol},
};

/// Computes an optimal local (Smith-Waterman) alignment between a sub-sequence of `a` and a
/// sub-sequence of `b`.
///
/// Uses the same recurrence as [`super::global::global`], except that any cell scoring below zero
/// restarts the alignment with a score of zero.  The alignment ends at the highest scoring cell
/// (the first one in row-major order on ties) and starts after the last zero-scoring cell on the
/// way back.  The start offsets (0-based, into `a` and `b`) are in [`Alignment::start`].
///
/// When no alignment scores above zero the result is empty, scores zero, and has no start.
pub fn local(a: &[Symbol], b: &[Symbol], matrix: &ScoringMatrix) -> Result<Alignment> {
    let (m, n) = (a.len(), b.len());
    if m == 0 && n == 0 {
        return Ok(Alignment::new(AlignmentMode::Local, 0.0, Vec::new(), None, 0, 0));
    }
    matrix.check_covers(a, b)?;

    let table = fill_table(a, b, matrix, true);
    let (i, j) = table.max_cell();
    let score = table.get(i, j).score;
    if score == 0.0 {
        return Ok(Alignment::new(AlignmentMode::Local, 0.0, Vec::new(), None, m, n));
    }
    trace!("Local alignment anchored at ({i}, {j}) with score {score}");

    let path = traceback(&table, i, j, |_, _, cell| cell.score == 0.0);
    Ok(Alignment::new(
        AlignmentMode::Local,
        score,
        path.steps,
        Some(path.stop),
        m,
        n,
    ))
}

#[cfg(test)]
pub mod tests {
    use itertools::Itertools;
    use rstest::rstest;

    use super::local;
    use crate::{
        align::{
            aligners::constants::Step::{Deletion, Insertion, Match},
            alignment::Alignment,
        },
        matrix::{ScoringMatrix, GAP},
    };

    /// Over `abc`: 1 for identical symbols, -1 for everything else (including the gap open).
    fn unit_matrix() -> ScoringMatrix {
        let symbols = [b'a', b'b', b'c', GAP];
        symbols
            .iter()
            .cartesian_product(symbols.iter())
            .map(|(&x, &y)| ((x, y), if x == y && x != GAP { 1.0 } else { -1.0 }))
            .collect()
    }

    /// Match 2, mismatch -1, gap-open -3, gap-extend -1, over ACGT.
    fn dna_affine() -> ScoringMatrix {
        let bases = b"ACGT";
        bases
            .iter()
            .cartesian_product(bases.iter())
            .map(|(&x, &y)| ((x, y), if x == y { 2.0 } else { -1.0 }))
            .chain(bases.iter().flat_map(|&x| [((x, GAP), -1.0), ((GAP, x), -1.0)]))
            .chain([((GAP, GAP), -3.0)])
            .collect()
    }

    fn assert_empty(alignment: &Alignment) {
        assert!(alignment.steps.is_empty(), "{alignment}");
        assert_eq!(alignment.score, 0.0, "{alignment}");
        assert_eq!(alignment.start, None, "{alignment}");
    }

    #[rstest]
    fn test_no_positive_alignment() {
        assert_empty(&local(b"aaaa", b"bbbb", &unit_matrix()).unwrap());
    }

    #[rstest]
    fn test_shared_core() {
        let alignment = local(b"bbaaaacc", b"ccaaaabb", &unit_matrix()).unwrap();
        assert_eq!(alignment.steps, vec![Match; 4], "{alignment}");
        assert_eq!(alignment.start, Some((2, 2)), "{alignment}");
        assert_eq!(alignment.score, 4.0, "{alignment}");
        assert_eq!(alignment.a_end(), Some(6));
        assert_eq!(alignment.b_end(), Some(6));
        alignment.validate();
    }

    #[rstest]
    fn test_first_maximum_wins() {
        // "ab" occurs twice in `b`; the earlier column is found first in row-major order
        let alignment = local(b"ab", b"abcab", &unit_matrix()).unwrap();
        assert_eq!(alignment.steps, vec![Match, Match]);
        assert_eq!(alignment.start, Some((0, 0)));
        assert_eq!(alignment.score, 2.0);
    }

    #[rstest]
    fn test_empty_inputs() {
        assert_empty(&local(b"", b"", &ScoringMatrix::new(Vec::new())).unwrap());
        assert_empty(&local(b"abc", b"", &unit_matrix()).unwrap());
        assert_empty(&local(b"", b"abc", &unit_matrix()).unwrap());
    }

    #[rstest]
    fn test_internal_deletion() {
        let a = b"TTACGTACGTGACGTACGT";
        let b = b"GGACGTACGTACGTACGT";
        let alignment = local(a, b, &dna_affine()).unwrap();
        let mut expected = vec![Match; 8];
        expected.push(Deletion);
        expected.extend([Match; 8]);
        assert_eq!(alignment.steps, expected, "{alignment}");
        assert_eq!(alignment.start, Some((2, 2)), "{alignment}");
        // 16 matches, one gap open and one extension
        assert_eq!(alignment.score, 32.0 - 4.0, "{alignment}");
        assert_eq!(alignment.rescore(a, b, &dna_affine()).unwrap(), alignment.score);
        alignment.validate();
    }

    #[rstest]
    fn test_internal_insertion() {
        let a = b"GGACGTACGTACGTACGT";
        let b = b"TTACGTACGTGACGTACGT";
        let alignment = local(a, b, &dna_affine()).unwrap();
        let mut expected = vec![Match; 8];
        expected.push(Insertion);
        expected.extend([Match; 8]);
        assert_eq!(alignment.steps, expected, "{alignment}");
        assert_eq!(alignment.start, Some((2, 2)), "{alignment}");
        assert_eq!(alignment.score, 28.0, "{alignment}");
        alignment.validate();
    }

    /// Builds a matrix over `symbols` (which should include [`GAP`]) from `score`, called for
    /// every pair.
    fn matrix_from<F: Fn(u8, u8) -> f64>(symbols: &[u8], score: F) -> ScoringMatrix {
        symbols
            .iter()
            .cartesian_product(symbols.iter())
            .map(|(&x, &y)| ((x, y), score(x, y)))
            .collect()
    }

    #[rstest]
    fn test_stops_on_zero_scoring_match() {
        // The mismatch at (2, 2) cancels the first match, leaving a Match cell scoring exactly 0
        let matrix = matrix_from(b"xaby\xff", |x, y| match (x, y) {
            (GAP, _) | (_, GAP) => -10.0,
            (b'y', b'y') => 3.0,
            (x, y) if x == y => 1.0,
            _ => -1.0,
        });
        let alignment = local(b"xay", b"xby", &matrix).unwrap();
        assert_eq!(alignment.steps, vec![Match], "{alignment}");
        assert_eq!(alignment.start, Some((2, 2)), "{alignment}");
        assert_eq!(alignment.score, 3.0, "{alignment}");
        alignment.validate();
    }

    #[rstest]
    fn test_stops_on_zero_scoring_deletion() {
        // Deleting `x` next to the origin scores +1 with a -1 gap open, leaving a Deletion cell
        // scoring exactly 0 at (1, 0)
        let matrix = matrix_from(b"xy\xff", |x, y| match (x, y) {
            (GAP, GAP) => -1.0,
            (b'x', GAP) => 1.0,
            (GAP, _) | (_, GAP) => -5.0,
            (b'y', b'y') => 3.0,
            _ => -1.0,
        });
        let alignment = local(b"xy", b"y", &matrix).unwrap();
        assert_eq!(alignment.steps, vec![Match], "{alignment}");
        assert_eq!(alignment.start, Some((1, 0)), "{alignment}");
        assert_eq!(alignment.score, 3.0, "{alignment}");
        alignment.validate();
    }

    #[rstest]
    fn test_leading_gap_starts_at_stop_cell() {
        // Positive deletions: the whole of `a` is deleted and the start is the origin itself
        let matrix: ScoringMatrix = [((b'x', GAP), 2.0), ((GAP, GAP), 0.0)].into_iter().collect();
        let alignment = local(b"xx", b"", &matrix).unwrap();
        assert_eq!(alignment.steps, vec![Deletion, Deletion], "{alignment}");
        assert_eq!(alignment.start, Some((0, 0)), "{alignment}");
        assert_eq!(alignment.score, 4.0, "{alignment}");
        alignment.validate();
    }

    #[rstest]
    fn test_missing_pair_is_an_error() {
        assert!(local(b"abd", b"ab", &unit_matrix()).is_err());
    }

    #[rstest]
    #[case(b"GATTACA", b"GCATGCT")]
    #[case(b"AAAAAAAA", b"AAA")]
    #[case(b"ACGT", b"TGCA")]
    #[case(b"TTTTGGGGCCCC", b"GGGG")]
    #[case(b"ACGTTTTTACGT", b"ACGTACGT")]
    fn test_score_is_non_negative_and_additive(#[case] a: &[u8], #[case] b: &[u8]) {
        let matrix = dna_affine();
        let alignment = local(a, b, &matrix).unwrap();
        assert!(alignment.score >= 0.0, "{alignment}");
        assert_eq!(alignment.rescore(a, b, &matrix).unwrap(), alignment.score);
        alignment.validate();
        // deterministic
        assert_eq!(local(a, b, &matrix).unwrap(), alignment);
    }
}
