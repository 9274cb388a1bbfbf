use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The alignment operations.  Each consumes one symbol from `a`, one from `b`, or one of each.
///
/// Inside the dynamic programming tables an `Option<Step>` is used, where `None` marks a cell in
/// which no alignment has started (the origin, or a local alignment restart).
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum Step {
    Match,     // Consumes one a and one b symbol
    Deletion,  // Consumes a single a symbol, aligned to a gap
    Insertion, // Consumes a single b symbol, aligned to a gap
}

impl Step {
    pub fn length_on_a(self) -> usize {
        match self {
            Step::Match | Step::Deletion => 1,
            Step::Insertion => 0,
        }
    }

    pub fn length_on_b(self) -> usize {
        match self {
            Step::Match | Step::Insertion => 1,
            Step::Deletion => 0,
        }
    }

    pub fn is_gap(self) -> bool {
        !matches!(self, Step::Match)
    }

    /// The operator used when rendering steps as a CIGAR-like string.
    pub fn as_char(self) -> char {
        match self {
            Step::Match => 'M',
            Step::Deletion => 'D',
            Step::Insertion => 'I',
        }
    }
}

/// The supported alignment modes.
///
/// The default alignment mode is Global.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    /// Aligns the full `a` versus the full `b` (Needleman-Wunsch).
    #[default]
    Global,
    /// Aligns a sub-sequence of `a` versus a sub-sequence of `b` (Smith-Waterman).
    Local,
}

impl Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl FromStr for AlignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" | "nw" | "needleman-wunsch" => Ok(AlignmentMode::Global),
            "local" | "sw" | "smith-waterman" => Ok(AlignmentMode::Local),
            _ => Err(anyhow!("Invalid alignment mode: {}", s)),
        }
    }
}
