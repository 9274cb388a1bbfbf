//! Reading substitution matrices in the NCBI text format, e.g.:
//!
//! ```text
//! # comment
//!    A  R  N
//! A  4 -1 -2
//! R -1  5  0
//! N -2  0  6
//! ```
//!
//! The file provides substitution scores only; gap scores are supplied by the caller.
use std::io::BufRead;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use fgoxide::io::Io;
use itertools::Itertools;
use log::debug;

use super::{Score, ScoringMatrix, Symbol, GAP};
use crate::util::io::BUFFER_SIZE;

/// Parses a single-character column or row label.
fn parse_symbol(token: &str, line_number: usize) -> Result<Symbol> {
    match token.as_bytes() {
        [symbol] if *symbol != GAP => Ok(*symbol),
        _ => bail!("Expected a single character symbol on line {line_number}, found: '{token}'"),
    }
}

/// Reads an NCBI-format matrix, adding `(s, GAP)` and `(GAP, s)` with `gap_extend` for every row
/// and column symbol, and `(GAP, GAP)` with `gap_open`.
pub fn read<R: BufRead>(reader: R, gap_open: Score, gap_extend: Score) -> Result<ScoringMatrix> {
    let mut columns: Option<Vec<Symbol>> = None;
    let mut rows: Vec<Symbol> = Vec::new();
    let mut pairs: Vec<((Symbol, Symbol), Score)> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("Error reading matrix line {line_number}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();

        let header = match columns {
            Some(ref header) => header,
            None => {
                let header = tokens
                    .map(|token| parse_symbol(token, line_number))
                    .collect::<Result<Vec<_>>>()?;
                ensure!(
                    header.iter().all_unique(),
                    "Duplicate column symbol in matrix header on line {line_number}"
                );
                columns = Some(header);
                continue;
            }
        };

        let row = match tokens.next() {
            Some(token) => parse_symbol(token, line_number)?,
            None => continue,
        };
        ensure!(
            !rows.contains(&row),
            "Duplicate row symbol '{}' on line {line_number}",
            row as char
        );
        let scores = tokens
            .map(|token| {
                token
                    .parse::<Score>()
                    .with_context(|| format!("Invalid score '{token}' on line {line_number}"))
            })
            .collect::<Result<Vec<_>>>()?;
        ensure!(
            scores.len() == header.len(),
            "Expected {} scores for row '{}' on line {line_number}, found {}",
            header.len(),
            row as char,
            scores.len()
        );
        pairs.extend(
            header
                .iter()
                .zip(scores)
                .map(|(&column, score)| ((row, column), score)),
        );
        rows.push(row);
    }

    let columns = match columns {
        Some(columns) => columns,
        None => bail!("Matrix has no header line"),
    };
    ensure!(!rows.is_empty(), "Matrix has no rows");

    let symbols = columns.iter().chain(rows.iter()).copied().unique().collect_vec();
    debug!(
        "Read a {}x{} matrix over {} symbols",
        rows.len(),
        columns.len(),
        symbols.len()
    );
    pairs.extend(
        symbols
            .iter()
            .flat_map(|&s| [((s, GAP), gap_extend), ((GAP, s), gap_extend)]),
    );
    pairs.push(((GAP, GAP), gap_open));
    Ok(ScoringMatrix::new(pairs))
}

/// Reads an NCBI-format matrix from a (possibly gzipped) file.
pub fn from_path<P: AsRef<Path>>(
    path: &P,
    gap_open: Score,
    gap_extend: Score,
) -> Result<ScoringMatrix> {
    let fg_io = Io::new(5, BUFFER_SIZE);
    let reader = fg_io
        .new_reader(path)
        .with_context(|| format!("Error opening matrix: {}", path.as_ref().display()))?;
    read(reader, gap_open, gap_extend)
        .with_context(|| format!("Error parsing matrix: {}", path.as_ref().display()))
}

#[cfg(test)]
pub mod tests {
    use rstest::rstest;

    use super::read;
    use crate::matrix::GAP;

    const SMALL: &str = "\
# A small matrix
# with comments

   A  C  *
A  4 -1 -4
C -1  9 -4
* -4 -4  1
";

    #[rstest]
    fn test_read_small_matrix() {
        let matrix = read(SMALL.as_bytes(), -11.0, -1.0).unwrap();
        assert_eq!(matrix.get(b'A', b'A').unwrap(), 4.0);
        assert_eq!(matrix.get(b'C', b'A').unwrap(), -1.0);
        assert_eq!(matrix.get(b'*', b'*').unwrap(), 1.0);
        assert_eq!(matrix.get(b'C', GAP).unwrap(), -1.0);
        assert_eq!(matrix.get(GAP, b'*').unwrap(), -1.0);
        assert_eq!(matrix.gap_open().unwrap(), -11.0);
        // 9 substitutions, 6 gap extensions, 1 gap open
        assert_eq!(matrix.len(), 16);
        assert!(matrix.check_covers(b"AC*", b"CA").is_ok());
    }

    #[rstest]
    fn test_read_real_valued_scores() {
        let text = "  a b\na 1.5 -0.25\nb -0.25 2\n";
        let matrix = read(text.as_bytes(), -2.0, -0.5).unwrap();
        assert_eq!(matrix.get(b'a', b'a').unwrap(), 1.5);
        assert_eq!(matrix.get(b'b', b'a').unwrap(), -0.25);
    }

    #[rstest]
    #[case("", "no header")]
    #[case("  A C\n", "no rows")]
    #[case("  A C\nA 1\n", "Expected 2 scores")]
    #[case("  A C\nA 1 x\n", "Invalid score")]
    #[case("  A CC\n", "single character")]
    #[case("  A A\n", "Duplicate column")]
    #[case("  A\nA 1\nA 2\n", "Duplicate row")]
    fn test_read_errors(#[case] text: &str, #[case] message: &str) {
        let err = format!("{:#}", read(text.as_bytes(), -1.0, -1.0).unwrap_err());
        assert!(err.contains(message), "{err}");
    }
}
