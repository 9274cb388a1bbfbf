use std::{borrow::Cow, io::BufRead, path::Path};

use anyhow::{ensure, Context, Result};
use fgoxide::io::Io;
use log::debug;
use seq_io::fasta::Reader as FastaReader;

use crate::util::{dna::reverse_complement, io::BUFFER_SIZE};

/// A target sequence, held on both strands.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct TargetSeq {
    pub name: String,
    pub fwd: Vec<u8>,
    pub revcomp: Vec<u8>,
}

impl TargetSeq {
    /// Creates a new `TargetSeq` with the given name and forward sequence.
    pub fn new(name: &str, seq: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            fwd: seq.to_vec(),
            revcomp: reverse_complement(seq),
        }
    }

    pub fn len(&self) -> usize {
        self.fwd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fwd.is_empty()
    }
}

/// The first whitespace-delimited token of a FASTA/FASTQ header.
pub fn header_to_name(header: &[u8]) -> Result<String> {
    let header: Cow<str> = String::from_utf8_lossy(header);
    header
        .split_whitespace()
        .next()
        .map(ToString::to_string)
        .context("empty sequence name")
}

/// Reads every record of a FASTA (optionally gzipped) as a [`TargetSeq`], in file order.
pub fn from_fasta<P: AsRef<Path>>(file: &P, upper_case: bool) -> Result<Vec<TargetSeq>> {
    let path = file.as_ref();
    let fg_io: Io = Io::new(5, BUFFER_SIZE);
    let reader: Box<dyn BufRead + Send> = fg_io
        .new_reader(&path)
        .with_context(|| format!("Error opening FASTA: {}", path.display()))?;
    from_reader(reader, upper_case)
        .with_context(|| format!("Error reading FASTA: {}", path.display()))
}

/// Reads every FASTA record from `reader` as a [`TargetSeq`], in order.
pub fn from_reader<R: BufRead>(reader: R, upper_case: bool) -> Result<Vec<TargetSeq>> {
    let mut source = FastaReader::with_capacity(reader, BUFFER_SIZE);
    let mut targets = Vec::new();
    while let Some(result) = source.next() {
        let record = result?.to_owned_record();
        let name = header_to_name(&record.head)?;
        let seq = if upper_case {
            record.seq.to_ascii_uppercase()
        } else {
            record.seq
        };
        targets.push(TargetSeq::new(&name, &seq));
    }
    ensure!(!targets.is_empty(), "Found no sequences in the FASTA");
    debug!("Read {} target sequence(s)", targets.len());
    Ok(targets)
}
