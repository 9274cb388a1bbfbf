//! Predefined scoring matrices.
use itertools::Itertools;
use lazy_static::lazy_static;

use super::{Score, ScoringMatrix, Symbol, GAP};

/// The amino-acid alphabet (including ambiguity codes and the stop `*`) covered by the protein
/// matrices.
pub const AMINO_ACIDS: &[u8; 24] = b"ARNDCQEGHILKMFPSTWYVBZX*";

/// The gap-open score used by the protein matrices.
pub const PROTEIN_GAP_OPEN: Score = -10.0;

/// The per-position gap score used by the protein matrices.  Together with [`PROTEIN_GAP_OPEN`]
/// a gap of length `k` scores `-10 - k`.
pub const PROTEIN_GAP_EXTEND: Score = -1.0;

lazy_static! {
    pub static ref LEVENSHTEIN: ScoringMatrix = levenshtein();
    pub static ref BLOSUM62: ScoringMatrix = blosum62();
    pub static ref PAM250: ScoringMatrix = pam250();
}

/// Unit-cost edit distance as a matrix to maximize: `0` for identical symbols and `-1` otherwise,
/// over every pair of byte values.
///
/// Since `GAP == GAP`, the gap-open entry is `0`: gaps cost exactly one per position, and the
/// optimal global score is the negated Levenshtein distance.
pub fn levenshtein() -> ScoringMatrix {
    (0..=Symbol::MAX)
        .cartesian_product(0..=Symbol::MAX)
        .map(|(x, y)| ((x, y), if x == y { 0.0 } else { -1.0 }))
        .collect()
}

/// BLOSUM62, with [`PROTEIN_GAP_OPEN`] and [`PROTEIN_GAP_EXTEND`] gap scores.  Residues match
/// case-insensitively.
pub fn blosum62() -> ScoringMatrix {
    from_substitution_fn(bio::scores::blosum62)
}

/// PAM250, with [`PROTEIN_GAP_OPEN`] and [`PROTEIN_GAP_EXTEND`] gap scores.  Residues match
/// case-insensitively.
pub fn pam250() -> ScoringMatrix {
    from_substitution_fn(bio::scores::pam250)
}

fn from_substitution_fn(substitution: fn(u8, u8) -> i32) -> ScoringMatrix {
    let residues = AMINO_ACIDS
        .iter()
        .flat_map(|&residue| [residue, residue.to_ascii_lowercase()])
        .unique()
        .collect_vec();

    let substitutions = residues
        .iter()
        .cartesian_product(residues.iter())
        .map(|(&x, &y)| {
            let score = substitution(x.to_ascii_uppercase(), y.to_ascii_uppercase());
            ((x, y), Score::from(score))
        });
    let gaps = residues
        .iter()
        .flat_map(|&r| [((r, GAP), PROTEIN_GAP_EXTEND), ((GAP, r), PROTEIN_GAP_EXTEND)]);

    substitutions
        .chain(gaps)
        .chain(std::iter::once(((GAP, GAP), PROTEIN_GAP_OPEN)))
        .collect()
}

#[cfg(test)]
pub mod tests {
    use rstest::rstest;

    use super::{BLOSUM62, LEVENSHTEIN, PAM250};
    use crate::matrix::GAP;

    #[rstest]
    fn test_levenshtein_covers_every_byte() {
        assert_eq!(LEVENSHTEIN.len(), 256 * 256);
        for x in 0..=u8::MAX {
            assert_eq!(LEVENSHTEIN.get(x, x).unwrap(), 0.0);
        }
        assert_eq!(LEVENSHTEIN.get(b'a', b'b').unwrap(), -1.0);
        assert_eq!(LEVENSHTEIN.get(b'a', GAP).unwrap(), -1.0);
        assert_eq!(LEVENSHTEIN.get(GAP, 0).unwrap(), -1.0);
        // no affine premium
        assert_eq!(LEVENSHTEIN.gap_open().unwrap(), 0.0);
    }

    #[rstest]
    #[case(b'A', b'A', 4.0)]
    #[case(b'W', b'W', 11.0)]
    #[case(b'a', b'W', -3.0)]
    #[case(b'C', b'c', 9.0)]
    fn test_blosum62(#[case] x: u8, #[case] y: u8, #[case] expected: f64) {
        assert_eq!(BLOSUM62.get(x, y).unwrap(), expected);
    }

    #[rstest]
    #[case(b'W', b'W', 17.0)]
    #[case(b'A', b'A', 2.0)]
    #[case(b'c', b'W', -8.0)]
    fn test_pam250(#[case] x: u8, #[case] y: u8, #[case] expected: f64) {
        assert_eq!(PAM250.get(x, y).unwrap(), expected);
    }

    #[rstest]
    fn test_protein_gaps() {
        for matrix in [&*BLOSUM62, &*PAM250] {
            assert_eq!(matrix.gap_open().unwrap(), -10.0);
            assert_eq!(matrix.get(b'K', GAP).unwrap(), -1.0);
            assert_eq!(matrix.get(GAP, b'k').unwrap(), -1.0);
            assert!(matrix.check_covers(b"MKVLAW*", b"mkvlaw").is_ok());
            assert!(matrix.get(b'J', b'A').is_err());
        }
    }
}
