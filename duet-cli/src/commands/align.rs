use super::{
    command::{Command, ValueEnum},
    output::{OutputFormat, RecordWriter},
};
use anyhow::{anyhow, ensure, Context, Result};
use clap::{
    builder::{PossibleValuesParser, TypedValueParser as _},
    Parser,
};
use duet::{
    align::{
        io::{FastxGroupingIterator, FastxThreadReader, OutputMessage, OutputResult},
        AlignmentMode, Builder,
    },
    matrix::{
        ncbi,
        predefined::{BLOSUM62, LEVENSHTEIN, PAM250, PROTEIN_GAP_OPEN},
        Score, ScoringMatrix,
    },
    util::{target_seq, version::built_info},
};
use log::{info, warn};
use proglog::{CountFormatterKind, ProgLogBuilder};
use std::{
    convert::Infallible,
    fmt::Display,
    io::{self, BufWriter},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
    thread::JoinHandle,
};

/// Log progress every this many queries.
const PROGRESS_UNIT: u64 = 10_000;

impl ValueEnum for AlignmentMode {
    fn variants() -> &'static [Self] {
        &[Self::Global, Self::Local]
    }
}

/// Where the scoring matrix comes from: a predefined matrix by name, or an NCBI-format file.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixSource {
    Levenshtein,
    Blosum62,
    Pam250,
    File(PathBuf),
}

impl MatrixSource {
    /// Loads the matrix.  `gap_extend` is the per-position gap score given to every residue of a
    /// matrix file, whose gap open defaults to [`PROTEIN_GAP_OPEN`].
    pub fn load(&self, gap_extend: Score) -> Result<ScoringMatrix> {
        match self {
            Self::Levenshtein => Ok(LEVENSHTEIN.clone()),
            Self::Blosum62 => Ok(BLOSUM62.clone()),
            Self::Pam250 => Ok(PAM250.clone()),
            Self::File(path) => ncbi::from_path(path, PROTEIN_GAP_OPEN, gap_extend),
        }
    }
}

impl Display for MatrixSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Levenshtein => write!(f, "levenshtein"),
            Self::Blosum62 => write!(f, "blosum62"),
            Self::Pam250 => write!(f, "pam250"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for MatrixSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "levenshtein" | "edit" => Self::Levenshtein,
            "blosum62" => Self::Blosum62,
            "pam250" => Self::Pam250,
            _ => Self::File(PathBuf::from(s)),
        })
    }
}

/// Aligns each query sequence against every target sequence.
///
/// Each query is aligned to each target in turn, globally (Needleman-Wunsch) or locally
/// (Smith-Waterman), under an affine-gap scoring matrix: every gapped residue scores its
/// `(residue, gap)` entry, and every run of gaps additionally pays the matrix's gap-open entry
/// once.  With `--double-strand` the query is also aligned to the reverse complement of each
/// target, and the better scoring strand is reported.
///
/// ## Inputs
///
/// Queries may be FASTA or FASTQ, optionally GZIP compressed, or `-` for standard input; the
/// format is detected from the first record.  Targets are read from a FASTA.
///
/// ## Scoring matrices
///
/// `--matrix` takes one of the predefined matrices or a path to a matrix in the NCBI text format
/// (as distributed with BLAST).  `levenshtein` scores 0 for identical symbols and -1 for
/// everything else, so a global alignment scores the negated edit distance; it never scores a
/// local alignment above zero.  `blosum62` and `pam250` score amino acids with a gap open of -10
/// and a gap extend of -1.  A matrix file gets a gap open of -10 and `--gap-extend` per gapped
/// residue.  `--gap-open` replaces the gap open of any matrix.
///
/// ## Output
///
/// One record per query and target, in input order, written to standard output.  Offsets are
/// 0-based, ends exclusive, and target offsets are on the strand the query aligned to.  Local
/// alignments that score no higher than zero are reported with `*` offsets and CIGAR.
#[derive(Parser, Debug, Clone)]
#[clap(version = built_info::VERSION.as_str(), term_width=0)]
pub struct Align {
    /// The path to the query FASTA or FASTQ, or `-` for standard input.
    #[clap(long, short = 'q', display_order = 1)]
    queries: PathBuf,

    /// The path to the target FASTA.
    #[clap(long, short = 't', display_order = 2)]
    targets: PathBuf,

    /// The alignment mode:
    /// - Global: aligns the full query versus the full target.
    /// - Local: aligns a sub-sequence of the query versus a sub-sequence of the target.
    #[clap(
        long,
        short = 'm',
        value_parser = PossibleValuesParser::new(AlignmentMode::possible_values())
            .map(|s| s.parse::<AlignmentMode>().unwrap()),
        default_value_t = AlignmentMode::Global,
        ignore_case = true,
        display_order = 3,
        verbatim_doc_comment
    )]
    mode: AlignmentMode,

    /// The scoring matrix: `levenshtein`, `blosum62`, `pam250`, or the path to an NCBI-format
    /// matrix.
    #[clap(long, short = 'M', default_value = "levenshtein", display_order = 4)]
    matrix: MatrixSource,

    /// Replace the matrix's gap-open score, charged once per run of gaps.
    #[clap(long, allow_hyphen_values = true, display_order = 5)]
    gap_open: Option<Score>,

    /// The score for each gapped residue when reading a matrix file.
    #[clap(long, default_value = "-1", allow_hyphen_values = true, display_order = 6)]
    gap_extend: Score,

    /// Add the mirror of every matrix entry, failing if any pair and its mirror differ.
    #[clap(long, default_value = "false", display_order = 7)]
    symmetrize: bool,

    /// Upper-case the query and target sequences before aligning.
    #[clap(long, short = 'u', default_value = "false", display_order = 8)]
    upper_case: bool,

    /// Also align to the reverse complement of each target, reporting the better strand.
    #[clap(long, short = 'd', default_value = "false", display_order = 9)]
    double_strand: bool,

    /// The output format.
    #[clap(
        long,
        short = 'o',
        value_parser = PossibleValuesParser::new(OutputFormat::possible_values())
            .map(|s| s.parse::<OutputFormat>().unwrap()),
        default_value_t = OutputFormat::Tsv,
        ignore_case = true,
        display_order = 10
    )]
    output_format: OutputFormat,

    /// The number of aligner threads to use.
    #[clap(long, short = '@', default_value = "2", display_order = 11)]
    threads: usize,

    /// Assume an input with an unrecognized file extension is GZIP compressed.
    #[clap(long, short = 'z', default_value = "false", display_order = 12)]
    decompress: bool,
}

impl Align {
    /// Executes the align command
    pub fn execute(&self) -> Result<()> {
        ensure!(self.threads > 0, "Must specify at least one thread");
        info!("Starting alignment...");
        info!("Reading target FASTA from {}", self.targets.display());
        info!("Reading queries from {}", self.queries.display());
        if !matches!(self.matrix, MatrixSource::File(_)) && self.gap_extend != -1.0 {
            warn!("--gap-extend only applies to matrix files, ignoring it for {}", self.matrix);
        }

        let progress_logger = ProgLogBuilder::new()
            .name("duet-progress")
            .noun("queries")
            .verb("Aligned")
            .unit(PROGRESS_UNIT)
            .count_formatter(CountFormatterKind::Comma)
            .build();

        // Build one aligner up front; it is cheap to clone into each thread as the matrix is
        // shared.
        let matrix = self
            .matrix
            .load(self.gap_extend)
            .with_context(|| format!("Error loading scoring matrix: {}", self.matrix))?;
        info!("Using the {} matrix with {} pairs", self.matrix, matrix.len());
        let aligner = Builder::default()
            .mode(self.mode)
            .matrix(Arc::new(matrix))
            .gap_open(self.gap_open)
            .symmetrize(self.symmetrize)
            .build_aligner()?;

        // Read in the target FASTA records - these are shared across threads
        let targets = Arc::new(target_seq::from_fasta(&self.targets, self.upper_case)?);
        info!("Read {} target(s)", targets.len());

        // Create the thread to read in the query records
        let reader = FastxThreadReader::new(self.queries.clone(), self.decompress, self.threads);

        // Create and start the aligner threads.  Each exits once the reader is done and the
        // channel is drained.
        let thread_handles: Vec<JoinHandle<()>> = (0..self.threads)
            .map(|_| {
                let to_align_rx = reader.to_align_rx.clone();
                let targets = Arc::clone(&targets);
                let aligner = aligner.clone();
                let upper_case = self.upper_case;
                let double_strand = self.double_strand;

                std::thread::spawn(move || {
                    while let Ok(msg) = to_align_rx.recv() {
                        let mut results: Vec<OutputResult> = Vec::with_capacity(msg.records.len());
                        for group in FastxGroupingIterator::new(msg.records.into_iter()) {
                            let query = if upper_case {
                                group[0].seq_upper_case()
                            } else {
                                group[0].seq.clone()
                            };
                            let hits = aligner.align_to_targets(&query, &targets, double_strand);
                            for record in group {
                                let hits = match &hits {
                                    Ok(hits) => Ok(hits.clone()),
                                    Err(err) => Err(anyhow!("{:#}", err)),
                                };
                                results.push((record, hits));
                            }
                        }
                        // The writer has stopped if this fails, and will report why
                        if msg.oneshot.send(OutputMessage { results }).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();

        // Write the alignments in input order
        let stdout = io::stdout().lock();
        let mut writer = RecordWriter::new(self.output_format, BufWriter::new(stdout))?;
        let mut num_queries: u64 = 0;
        for receiver in reader.to_output_rx.iter() {
            let msg = receiver
                .recv()
                .map_err(|_| anyhow!("An aligner thread stopped before sending its results"))?;
            for (record, hits) in msg.results {
                let name = record.name()?;
                let hits = hits.with_context(|| format!("Error aligning query: {name}"))?;
                let query = if self.upper_case {
                    record.seq_upper_case()
                } else {
                    record.seq
                };
                writer.write(&name, &query, &targets, &hits)?;
                progress_logger.record();
                num_queries += 1;
            }
        }
        writer.flush()?;

        // All done, shut down the reader and alignment threads
        match reader.handle.join() {
            Ok(result) => result?,
            Err(e) => std::panic::resume_unwind(e),
        };
        drop(reader.to_align_rx);
        for handle in thread_handles {
            if let Err(e) = handle.join() {
                std::panic::resume_unwind(e);
            }
        }

        info!("Aligned {num_queries} queries against {} target(s)", targets.len());
        Ok(())
    }
}

impl Command for Align {
    fn execute(&self) -> Result<()> {
        Align::execute(self)
    }
}
