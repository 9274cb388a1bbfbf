pub(crate) mod constants;
pub(crate) mod global;
pub(crate) mod local;

use std::sync::Arc;

use anyhow::Result;
use derive_builder::Builder;
use log::debug;

use crate::{
    align::{
        aligners::constants::{AlignmentMode, Step},
        alignment::Alignment,
        traceback::{Cell, Table},
    },
    matrix::{predefined::LEVENSHTEIN, Score, ScoringMatrix, Symbol, GAP},
    util::target_seq::TargetSeq,
};

/// Fills the `(|a| + 1) x (|b| + 1)` table shared by the global and local aligners.
///
/// `(i, j)` holds the best score aligning `a[..i]` with `b[..j]` and the step taken into it:
/// - Match: `(i-1, j-1) + s(a[i-1], b[j-1])`
/// - Deletion: `(i-1, j) + s(a[i-1], GAP)`, plus the gap open unless `(i-1, j)` is a deletion
/// - Insertion: `(i, j-1) + s(GAP, b[j-1])`, plus the gap open unless `(i, j-1)` is an insertion
///
/// The first column is all deletions and the first row all insertions, each paying the gap open
/// only on the cell next to the origin.  Ties prefer a match, then a deletion, then an insertion.
///
/// With `clamp_at_zero` (local alignment) any cell scoring below zero is reset to
/// [`Cell::START`].
///
/// The matrix must cover `a` and `b` (see [`ScoringMatrix::check_covers`]).
pub(crate) fn fill_table(
    a: &[Symbol],
    b: &[Symbol],
    matrix: &ScoringMatrix,
    clamp_at_zero: bool,
) -> Table {
    let (m, n) = (a.len(), b.len());
    let gap_open = matrix.lookup(GAP, GAP);
    let settle = |cell: Cell| -> Cell {
        if clamp_at_zero && cell.score < 0.0 {
            Cell::START
        } else {
            cell
        }
    };

    let mut table = Table::new(m, n);

    // First column: deleting a[..i]
    for i in 1..=m {
        let mut score = table.get(i - 1, 0).score + matrix.lookup(a[i - 1], GAP);
        if i == 1 {
            score += gap_open;
        }
        table.set(i, 0, settle(Cell::new(score, Step::Deletion)));
    }

    // First row: inserting b[..j]
    for j in 1..=n {
        let mut score = table.get(0, j - 1).score + matrix.lookup(GAP, b[j - 1]);
        if j == 1 {
            score += gap_open;
        }
        table.set(0, j, settle(Cell::new(score, Step::Insertion)));
    }

    for i in 1..=m {
        let x = a[i - 1];
        let deletion_extend = matrix.lookup(x, GAP);
        for j in 1..=n {
            let y = b[j - 1];
            let diag = table.get(i - 1, j - 1);
            let up = table.get(i - 1, j);
            let left = table.get(i, j - 1);

            let mut best = Cell::new(diag.score + matrix.lookup(x, y), Step::Match);

            let mut deletion = up.score + deletion_extend;
            if up.step != Some(Step::Deletion) {
                deletion += gap_open;
            }
            if deletion > best.score {
                best = Cell::new(deletion, Step::Deletion);
            }

            let mut insertion = left.score + matrix.lookup(GAP, y);
            if left.step != Some(Step::Insertion) {
                insertion += gap_open;
            }
            if insertion > best.score {
                best = Cell::new(insertion, Step::Insertion);
            }

            table.set(i, j, settle(best));
        }
    }

    table
}

/// Options for building an [`Aligner`].
#[derive(Clone, Debug, Builder)]
#[builder(name = "Builder", build_fn(name = "build_options"))]
pub struct Options {
    #[builder(default)]
    mode: AlignmentMode,
    /// The scoring matrix, shared read-only across aligners.
    #[builder(default = "Arc::new(LEVENSHTEIN.clone())")]
    matrix: Arc<ScoringMatrix>,
    /// Replaces the matrix's gap-open, `(GAP, GAP)`, entry.
    #[builder(default)]
    gap_open: Option<Score>,
    /// Symmetrize the matrix before aligning.
    #[builder(default = "false")]
    symmetrize: bool,
}

impl Builder {
    /// Builds an [`Aligner`], applying any gap-open override and symmetrization to the matrix.
    pub fn build_aligner(&self) -> Result<Aligner> {
        let opts = self.build_options()?;
        let mut matrix = opts.matrix;
        if let Some(gap_open) = opts.gap_open {
            debug!("Overriding the gap open score with {gap_open}");
            matrix = Arc::new(matrix.with_gap_open(gap_open));
        }
        if opts.symmetrize {
            debug!("Symmetrizing a scoring matrix with {} pairs", matrix.len());
            matrix = Arc::new(matrix.symmetrical()?);
        }
        Ok(Aligner::new(opts.mode, matrix))
    }
}

/// The best alignment of a query to one target.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetHit {
    /// Index of the target in the slice given to [`Aligner::align_to_targets`].
    pub target_index: usize,
    /// False if the query aligned to the reverse complement of the target.
    pub forward: bool,
    pub alignment: Alignment,
}

/// Aligns pairs of sequences in one mode with one scoring matrix.
#[derive(Clone, Debug)]
pub struct Aligner {
    mode: AlignmentMode,
    matrix: Arc<ScoringMatrix>,
}

impl Aligner {
    pub fn new(mode: AlignmentMode, matrix: Arc<ScoringMatrix>) -> Self {
        Self { mode, matrix }
    }

    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    pub fn matrix(&self) -> &ScoringMatrix {
        &self.matrix
    }

    /// Aligns `a` against `b`.
    pub fn align(&self, a: &[Symbol], b: &[Symbol]) -> Result<Alignment> {
        match self.mode {
            AlignmentMode::Global => global::global(a, b, &self.matrix),
            AlignmentMode::Local => local::local(a, b, &self.matrix),
        }
    }

    /// Aligns `query` against every target, returning one hit per target in target order.
    ///
    /// With `double_strand`, the query is also aligned to the reverse complement of each target
    /// and the better scoring strand is kept (the forward strand on ties).
    pub fn align_to_targets(
        &self,
        query: &[Symbol],
        targets: &[TargetSeq],
        double_strand: bool,
    ) -> Result<Vec<TargetHit>> {
        targets
            .iter()
            .enumerate()
            .map(|(target_index, target)| {
                let fwd = self.align(query, &target.fwd)?;
                let mut hit = TargetHit {
                    target_index,
                    forward: true,
                    alignment: fwd,
                };
                if double_strand {
                    let revcomp = self.align(query, &target.revcomp)?;
                    if revcomp.score > hit.alignment.score {
                        hit.forward = false;
                        hit.alignment = revcomp;
                    }
                }
                Ok(hit)
            })
            .collect()
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use itertools::Itertools;
    use rstest::rstest;

    use super::{fill_table, Builder};
    use crate::{
        align::aligners::constants::{
            AlignmentMode,
            Step::{Deletion, Insertion, Match},
        },
        matrix::{predefined::BLOSUM62, ScoringMatrix, GAP},
        util::target_seq::TargetSeq,
    };

    #[rstest]
    fn test_fill_table_edges_pay_one_gap_open() {
        let matrix = ScoringMatrix::new([
            ((b'a', b'a'), 1.0),
            ((b'a', GAP), -1.0),
            ((GAP, b'a'), -2.0),
            ((GAP, GAP), -5.0),
        ]);
        let table = fill_table(b"aa", b"aa", &matrix, false);
        assert_eq!(table.get(1, 0).score, -6.0);
        assert_eq!(table.get(2, 0).score, -7.0);
        assert_eq!(table.get(0, 1).score, -7.0);
        assert_eq!(table.get(0, 2).score, -9.0);
        assert_eq!(table.get(2, 0).step, Some(Deletion));
        assert_eq!(table.get(0, 2).step, Some(Insertion));
        assert_eq!(table.get(2, 2).score, 2.0);
        assert_eq!(table.get(2, 2).step, Some(Match));

        // the same edges are all clamped when aligning locally
        let table = fill_table(b"aa", b"aa", &matrix, true);
        assert_eq!(table.get(2, 0).score, 0.0);
        assert_eq!(table.get(2, 0).step, None);
        assert_eq!(table.get(0, 2).step, None);
        assert_eq!(table.get(2, 2).score, 2.0);
    }

    #[rstest]
    fn test_builder_defaults_to_global_levenshtein() {
        let aligner = Builder::default().build_aligner().unwrap();
        assert_eq!(aligner.mode(), AlignmentMode::Global);
        let alignment = aligner.align(b"kitten", b"sitting").unwrap();
        assert_eq!(alignment.score, -3.0);
    }

    #[rstest]
    fn test_builder_gap_open_override() {
        let aligner = Builder::default()
            .mode(AlignmentMode::Global)
            .gap_open(Some(-2.0))
            .build_aligner()
            .unwrap();
        assert_eq!(aligner.matrix().gap_open().unwrap(), -2.0);
        // one run of three deletions: three extensions plus one open
        let alignment = aligner.align(b"abcdef", b"abc").unwrap();
        assert_eq!(alignment.score, -5.0);
    }

    #[rstest]
    fn test_builder_symmetrize() {
        let matrix = Arc::new(ScoringMatrix::new([
            ((b'a', b'b'), -1.0),
            ((b'a', GAP), -1.0),
            ((GAP, b'a'), -1.0),
            ((GAP, b'b'), -1.0),
            ((GAP, GAP), 0.0),
        ]));
        let mut builder = Builder::default();
        builder.matrix(matrix);
        assert!(builder.build_aligner().unwrap().align(b"b", b"a").is_err());
        let aligner = builder.symmetrize(true).build_aligner().unwrap();
        assert_eq!(aligner.align(b"b", b"a").unwrap().score, -1.0);
    }

    #[rstest]
    fn test_align_protein_locally() {
        let aligner = Builder::default()
            .mode(AlignmentMode::Local)
            .matrix(Arc::new(BLOSUM62.clone()))
            .build_aligner()
            .unwrap();
        let alignment = aligner.align(b"PPPPHEAGAWGHEEPPPP", b"KKKKHEAGAWGHEEKKKK").unwrap();
        assert_eq!(alignment.start, Some((4, 4)));
        assert_eq!(alignment.steps, vec![Match; 10]);
    }

    #[rstest]
    fn test_align_to_targets_double_strand() {
        let targets = vec![
            TargetSeq::new("fwd", b"AACCGGTTAC"),
            TargetSeq::new("rev", b"GTAACCGGTT"),
        ];
        // match 1, mismatch and gaps -1, no gap open
        let bases = b"ACGT";
        let matrix: ScoringMatrix = bases
            .iter()
            .cartesian_product(bases.iter())
            .map(|(&x, &y)| ((x, y), if x == y { 1.0 } else { -1.0 }))
            .chain(bases.iter().flat_map(|&x| [((x, GAP), -1.0), ((GAP, x), -1.0)]))
            .chain([((GAP, GAP), 0.0)])
            .collect();
        let aligner = Builder::default()
            .mode(AlignmentMode::Local)
            .matrix(Arc::new(matrix))
            .build_aligner()
            .unwrap();
        let query = b"AACCGGTTAC";

        let single = aligner.align_to_targets(query, &targets, false).unwrap();
        assert_eq!(single.len(), 2);
        assert!(single.iter().all(|hit| hit.forward));

        let double = aligner.align_to_targets(query, &targets, true).unwrap();
        assert_eq!(double[0].target_index, 0);
        assert!(double[0].forward);
        assert_eq!(double[1].target_index, 1);
        assert!(!double[1].forward);
        assert_eq!(single[1].alignment.score, 8.0);
        assert_eq!(double[1].alignment.score, 10.0);
    }
}
