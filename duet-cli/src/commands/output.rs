use std::{fmt::Display, io::Write, str::FromStr};

use anyhow::{anyhow, Error, Result};
use duet::{
    align::{AlignmentMode, TargetHit},
    matrix::Score,
    util::target_seq::TargetSeq,
};
use serde::Serialize;

use super::command::ValueEnum;

/// How alignments are written.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub enum OutputFormat {
    /// One tab-separated line per hit, after a header line.
    #[default]
    Tsv,
    /// One JSON object per hit, per line.
    Json,
    /// A summary line and the three-line rendering of each hit.
    Pretty,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tsv => write!(f, "tsv"),
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" => Ok(Self::Tsv),
            "json" | "jsonl" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => Err(anyhow!("Invalid output format: {}", s)),
        }
    }
}

impl ValueEnum for OutputFormat {
    fn variants() -> &'static [Self] {
        &[Self::Tsv, Self::Json, Self::Pretty]
    }
}

const TSV_HEADER: [&str; 10] = [
    "query",
    "target",
    "strand",
    "mode",
    "score",
    "query_start",
    "target_start",
    "query_end",
    "target_end",
    "cigar",
];

/// One output row: a query's best hit against one target.  Target offsets are on the strand the
/// query aligned to.
#[derive(Debug, PartialEq, Serialize)]
pub struct HitRecord<'a> {
    pub query: &'a str,
    pub target: &'a str,
    pub strand: char,
    pub mode: AlignmentMode,
    pub score: Score,
    pub query_start: Option<usize>,
    pub target_start: Option<usize>,
    pub query_end: Option<usize>,
    pub target_end: Option<usize>,
    /// `*` when the alignment is empty.
    pub cigar: String,
}

impl<'a> HitRecord<'a> {
    pub fn new(query: &'a str, target: &'a TargetSeq, hit: &TargetHit) -> Self {
        let alignment = &hit.alignment;
        Self {
            query,
            target: &target.name,
            strand: if hit.forward { '+' } else { '-' },
            mode: alignment.mode,
            score: alignment.score,
            query_start: alignment.a_start(),
            target_start: alignment.b_start(),
            query_end: alignment.a_end(),
            target_end: alignment.b_end(),
            cigar: if alignment.is_empty() {
                "*".to_string()
            } else {
                alignment.cigar()
            },
        }
    }

    pub fn to_tsv(&self) -> String {
        fn offset(value: Option<usize>) -> String {
            value.map_or_else(|| "*".to_string(), |v| v.to_string())
        }
        [
            self.query.to_string(),
            self.target.to_string(),
            self.strand.to_string(),
            self.mode.to_string(),
            self.score.to_string(),
            offset(self.query_start),
            offset(self.target_start),
            offset(self.query_end),
            offset(self.target_end),
            self.cigar.clone(),
        ]
        .join("\t")
    }
}

/// Writes the hits of each query in the chosen [`OutputFormat`].
pub struct RecordWriter<W: Write> {
    format: OutputFormat,
    writer: W,
}

impl<W: Write> RecordWriter<W> {
    /// Creates the writer, writing the TSV header if needed.
    pub fn new(format: OutputFormat, mut writer: W) -> Result<Self> {
        if format == OutputFormat::Tsv {
            writeln!(writer, "{}", TSV_HEADER.join("\t"))?;
        }
        Ok(Self { format, writer })
    }

    /// Writes every hit of one query.  `query_seq` is the sequence that was aligned.
    pub fn write(
        &mut self,
        query: &str,
        query_seq: &[u8],
        targets: &[TargetSeq],
        hits: &[TargetHit],
    ) -> Result<()> {
        for hit in hits {
            let target = targets
                .get(hit.target_index)
                .ok_or_else(|| anyhow!("Bug: no target with index {}", hit.target_index))?;
            let record = HitRecord::new(query, target, hit);
            match self.format {
                OutputFormat::Tsv => writeln!(self.writer, "{}", record.to_tsv())?,
                OutputFormat::Json => {
                    serde_json::to_writer(&mut self.writer, &record)?;
                    writeln!(self.writer)?;
                }
                OutputFormat::Pretty => {
                    let target_seq = if hit.forward { &target.fwd } else { &target.revcomp };
                    writeln!(
                        self.writer,
                        "# {} vs {} ({}) {}",
                        record.query, record.target, record.strand, hit.alignment
                    )?;
                    if !hit.alignment.is_empty() {
                        writeln!(self.writer, "{}", hit.alignment.render(query_seq, target_seq))?;
                    }
                    writeln!(self.writer)?;
                }
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
