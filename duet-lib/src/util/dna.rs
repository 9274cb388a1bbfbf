use lazy_static::lazy_static;

/// IUPAC nucleotide codes, upper case.
pub const IUPAC_BASES: [u8; 15] = *b"ACGTNRYSWKMBDHV";

/// The complement of each of [`IUPAC_BASES`].
pub const IUPAC_COMPLEMENTS: [u8; 15] = *b"TGCANYRSWMKVHDB";

lazy_static! {
    /// Complement of every byte value.  Bytes that are not IUPAC codes (in either case) map to
    /// themselves, so the scoring-matrix gap sentinel survives reverse complementing.
    pub static ref COMPLEMENT: [u8; 256] = {
        let mut table = [0u8; 256];
        for (value, slot) in (0..=u8::MAX).zip(table.iter_mut()) {
            *slot = value;
        }
        for (&base, &comp) in IUPAC_BASES.iter().zip(IUPAC_COMPLEMENTS.iter()) {
            table[usize::from(base)] = comp;
            table[usize::from(base.to_ascii_lowercase())] = comp.to_ascii_lowercase();
        }
        table
    };
}

pub fn complement(base: u8) -> u8 {
    COMPLEMENT[usize::from(base)]
}

/// The reverse complement of `seq`, preserving case.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&base| complement(base)).collect()
}

#[cfg(test)]
pub mod tests {
    use rstest::rstest;

    use super::{complement, reverse_complement};

    #[rstest]
    #[case(b"", b"")]
    #[case(b"ACGT", b"ACGT")]
    #[case(b"AACCGGTTAC", b"GTAACCGGTT")]
    #[case(b"acgN", b"Ncgt")]
    #[case(b"RYKM", b"KMRY")]
    fn test_reverse_complement(#[case] seq: &[u8], #[case] expected: &[u8]) {
        assert_eq!(reverse_complement(seq), expected);
        assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
    }

    #[rstest]
    fn test_non_bases_are_unchanged() {
        assert_eq!(complement(b'*'), b'*');
        assert_eq!(complement(u8::MAX), u8::MAX);
        assert_eq!(complement(b'-'), b'-');
    }
}
