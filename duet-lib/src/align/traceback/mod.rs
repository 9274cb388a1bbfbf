use crate::{align::aligners::constants::Step, matrix::Score};

/// A dynamic programming cell: the best score reaching the cell and the step that produced it.
///
/// `step` is `None` at the origin, and in local alignment wherever the alignment (re)starts.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Cell {
    pub score: Score,
    pub step: Option<Step>,
}

impl Cell {
    pub const START: Cell = Cell {
        score: 0.0,
        step: None,
    };

    #[inline(always)]
    pub fn new(score: Score, step: Step) -> Self {
        Self {
            score,
            step: Some(step),
        }
    }
}

/// The full `(m + 1) x (n + 1)` table, stored row-major in one contiguous buffer.  Rows index
/// `a`, columns index `b`.
#[derive(Clone, PartialEq, Debug)]
pub struct Table {
    rows: usize,
    cols: usize,
    matrix: Vec<Cell>,
}

impl Table {
    /// Creates a table for sequences of length `m` and `n`, with every cell set to
    /// [`Cell::START`].
    pub fn new(m: usize, n: usize) -> Self {
        let rows = m + 1;
        let cols = n + 1;
        Table {
            rows,
            cols,
            matrix: vec![Cell::START; rows * cols],
        }
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, v: Cell) {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        self.matrix[i * self.cols + j] = v;
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> &Cell {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        &self.matrix[i * self.cols + j]
    }

    /// The coordinates of the highest scoring cell, scanning row-major.  The first cell seen wins
    /// ties.
    pub fn max_cell(&self) -> (usize, usize) {
        let mut best = 0;
        for (index, cell) in self.matrix.iter().enumerate() {
            if cell.score > self.matrix[best].score {
                best = index;
            }
        }
        (best / self.cols, best % self.cols)
    }
}

/// The steps recovered by walking back through a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// The steps, in the order `a` is consumed.
    pub steps: Vec<Step>,
    /// The cell at which the walk stopped, i.e. the predecessor of the first step.  Its
    /// coordinates are the 0-based offsets in `a` and `b` where the steps begin.
    pub stop: (usize, usize),
}

/// Walks back from cell `(i, j)`, following each cell's step (Match to the diagonal, Deletion
/// up, Insertion left), until `done` returns true for the current cell.
///
/// Panics if the walk reaches a cell with no step, or a step that would leave the table, before
/// `done` is satisfied.  Either indicates the table was filled incorrectly.
pub fn traceback<F>(table: &Table, i: usize, j: usize, done: F) -> Path
where
    F: Fn(usize, usize, &Cell) -> bool,
{
    let (mut i, mut j) = (i, j);
    let mut steps: Vec<Step> = Vec::with_capacity(i + j);
    loop {
        let cell = table.get(i, j);
        if done(i, j, cell) {
            break;
        }
        let step = match cell.step {
            Some(Step::Match) if i > 0 && j > 0 => {
                i -= 1;
                j -= 1;
                Step::Match
            }
            Some(Step::Deletion) if i > 0 => {
                i -= 1;
                Step::Deletion
            }
            Some(Step::Insertion) if j > 0 => {
                j -= 1;
                Step::Insertion
            }
            step => panic!("Bug: traceback cannot continue from ({i}, {j}) with step {step:?}"),
        };
        steps.push(step);
    }
    steps.reverse();
    Path {
        steps,
        stop: (i, j),
    }
}
