use super::aligners::TargetHit;
use crate::util::{
    io::{is_fasta_path, is_fastq_path, is_gzip_path, BUFFER_SIZE},
    target_seq::header_to_name,
};
use anyhow::{anyhow, Context, Result};
use derive_getters::Getters;
use flate2::bufread::MultiGzDecoder;
use flume::{bounded, Receiver, Sender};
use itertools::Itertools;
use log::debug;
use seq_io::{
    fasta::{Reader as FastaReader, RefRecord as FastaRefRecord},
    fastq::{Reader as FastqReader, RefRecord as FastqRefRecord},
};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    iter::Peekable,
    path::{Path, PathBuf},
    thread::JoinHandle,
};

/// The number of query records to include per chunk.
pub const RECORDS_PER_CHUNK: usize = 10;

/// The number of chunks allowed in a channel, per aligner thread.
pub const READER_CHANNEL_NUM_CHUNKS: usize = 100;

/// Enumeration of supported query file formats
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Fasta,
    Fastq,
}

impl Format {
    /// Detects the format from the first byte of the input: `@` for FASTQ, anything else
    /// (including no input) for FASTA.
    pub fn sniff<R: BufRead>(reader: &mut R) -> Result<Format> {
        let buf = reader.fill_buf().context("Error reading query input")?;
        match buf.first() {
            Some(b'@') => Ok(Format::Fastq),
            _ => Ok(Format::Fasta),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Getters)]
/// Common record struct that supports both FASTA and FASTQ
pub struct FastxOwnedRecord {
    pub head: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Option<Vec<u8>>,
}

impl FastxOwnedRecord {
    pub fn from_fastq(record: &FastqRefRecord) -> Self {
        let owned_record = record.to_owned_record();
        Self {
            head: owned_record.head,
            seq: owned_record.seq,
            qual: Some(owned_record.qual),
        }
    }

    pub fn from_fasta(record: &FastaRefRecord) -> Self {
        let owned_record = record.to_owned_record();
        Self {
            head: owned_record.head,
            seq: owned_record.seq,
            qual: None,
        }
    }

    /// The first whitespace-delimited token of the header.
    pub fn name(&self) -> Result<String> {
        header_to_name(&self.head)
    }

    pub fn seq_upper_case(&self) -> Vec<u8> {
        self.seq.iter().map(u8::to_ascii_uppercase).collect_vec()
    }
}

pub struct FastaToFastxIterator<R: Read>(FastaReader<R>);

impl<R: Read> Iterator for FastaToFastxIterator<R> {
    type Item = Result<FastxOwnedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|result| {
            result
                .map(|record| FastxOwnedRecord::from_fasta(&record))
                .context("Error reading FASTA record")
        })
    }
}

pub struct FastqToFastxIterator<R: Read>(FastqReader<R>);

impl<R: Read> Iterator for FastqToFastxIterator<R> {
    type Item = Result<FastxOwnedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|result| {
            result
                .map(|record| FastxOwnedRecord::from_fastq(&record))
                .context("Error reading FASTQ record")
        })
    }
}

/// Iterates over the FASTA or FASTQ records in `reader`, detecting the format from its first
/// byte.
pub fn fastx_records<'a, R: BufRead + 'a>(
    mut reader: R,
) -> Result<Box<dyn Iterator<Item = Result<FastxOwnedRecord>> + 'a>> {
    let format = Format::sniff(&mut reader)?;
    debug!("Reading queries as {format:?}");
    Ok(match format {
        Format::Fastq => Box::new(FastqToFastxIterator(FastqReader::with_capacity(
            reader,
            BUFFER_SIZE,
        ))),
        Format::Fasta => Box::new(FastaToFastxIterator(FastaReader::with_capacity(
            reader,
            BUFFER_SIZE,
        ))),
    })
}

/// A message that is sent from a [`FastxThreadReader`] to the aligner threadpool to align a chunk
/// of query records.
#[derive(Debug)]
pub struct InputMessage {
    /// The query records to align
    pub records: Vec<FastxOwnedRecord>,

    /// Where the records will be sent after alignment
    pub oneshot: Sender<OutputMessage>,
}

/// The output of aligning a single query: the query record and either its best hit against each
/// target (in target order) or the error that stopped it from aligning.
pub type OutputResult = (FastxOwnedRecord, Result<Vec<TargetHit>>);

/// The container for a chunk of alignments, one per input query record.
pub struct OutputMessage {
    pub results: Vec<OutputResult>,
}

/// Groups runs of consecutive records that have the same sequence, so they need only be aligned
/// once.
pub struct FastxGroupingIterator<I: Iterator<Item = FastxOwnedRecord>>(Peekable<I>);

impl<I: Iterator<Item = FastxOwnedRecord>> FastxGroupingIterator<I> {
    pub fn new(iter: I) -> Self {
        Self(iter.peekable())
    }
}

impl<I: Iterator<Item = FastxOwnedRecord>> Iterator for FastxGroupingIterator<I> {
    type Item = Vec<FastxOwnedRecord>;

    #[inline]
    fn next(&mut self) -> Option<Vec<FastxOwnedRecord>> {
        let first = self.0.next()?;
        let mut items: Vec<FastxOwnedRecord> = vec![first];
        while let Some(record) = self.0.next_if(|record| record.seq == items[0].seq) {
            items.push(record);
        }
        Some(items)
    }
}

/// A query reader that runs in its own thread and chunks records to send to a pool of aligners.
pub struct FastxThreadReader {
    /// The [`JoinHandle`] for the thread that is reading.
    pub handle: JoinHandle<Result<()>>,
    /// The channel that will be receiving [`InputMessage`]s.
    pub to_align_rx: Receiver<InputMessage>,
    /// The channel that will be receiving oneshot receivers of chunks of alignments
    pub to_output_rx: Receiver<Receiver<OutputMessage>>,
}

impl FastxThreadReader {
    /// Writes the chunk of records to the alignment channel, as well as a receiver to the output
    /// channel.
    fn write_records_to_txs(
        records: Vec<FastxOwnedRecord>,
        to_align_tx: &Sender<InputMessage>,
        to_output_tx: &Sender<Receiver<OutputMessage>>,
    ) -> Result<()> {
        let (records_tx, records_rx) = flume::unbounded(); // oneshot channel
        let input_msg = InputMessage {
            records,
            oneshot: records_tx,
        };
        to_align_tx
            .send(input_msg)
            .map_err(|_| anyhow!("Error sending records to the aligners"))?;
        to_output_tx
            .send(records_rx)
            .map_err(|_| anyhow!("Error sending receiver to the writer"))
    }

    /// Opens the path, or standard input for `-`, decompressing GZIP input recognized by its
    /// extension, or any input without a FASTA or FASTQ extension when `decompress` is set.
    fn open(file: &Path, decompress: bool) -> Result<Box<dyn BufRead>> {
        let raw_handle = if file.as_os_str() == "-" {
            Box::new(std::io::stdin()) as Box<dyn Read>
        } else {
            let handle = File::open(file)
                .with_context(|| format!("Error opening input: {}", file.display()))?;
            Box::new(handle) as Box<dyn Read>
        };
        let buf_handle = BufReader::with_capacity(BUFFER_SIZE, raw_handle);
        let unrecognized = !is_fastq_path(&file) && !is_fasta_path(&file);
        let is_gzip = is_gzip_path(&file) || (unrecognized && decompress);
        if is_gzip {
            Ok(Box::new(BufReader::with_capacity(
                BUFFER_SIZE,
                MultiGzDecoder::new(buf_handle),
            )))
        } else {
            Ok(Box::new(buf_handle))
        }
    }

    /// Creates a new `FastxThreadReader` in a new thread.
    pub fn new(file: PathBuf, decompress: bool, threads: usize) -> Self {
        // Channel to send chunks of records to align
        let (to_align_tx, to_align_rx): (Sender<InputMessage>, Receiver<InputMessage>) =
            bounded(READER_CHANNEL_NUM_CHUNKS * threads);

        // Channel to send receivers for each aligned chunk of records. The receivers maintain the
        // order of the records.
        let (to_output_tx, to_output_rx): (
            Sender<Receiver<OutputMessage>>,
            Receiver<Receiver<OutputMessage>>,
        ) = bounded(READER_CHANNEL_NUM_CHUNKS * threads);

        let handle = std::thread::spawn(move || {
            let reader = Self::open(&file, decompress)?;
            let records = fastx_records(reader)
                .with_context(|| format!("Error reading input: {}", file.display()))?;

            // Chunk the records to send over the output channel, keeping records with the same
            // sequence in the same chunk.
            let mut chunk = Vec::with_capacity(RECORDS_PER_CHUNK);
            for record in records {
                let record = record.with_context(|| format!("Error in: {}", file.display()))?;
                if chunk.len() >= RECORDS_PER_CHUNK
                    && chunk.last().map_or(false, |last: &FastxOwnedRecord| last.seq != record.seq)
                {
                    Self::write_records_to_txs(chunk, &to_align_tx, &to_output_tx)?;
                    chunk = Vec::with_capacity(RECORDS_PER_CHUNK);
                }
                chunk.push(record);
            }
            if !chunk.is_empty() {
                Self::write_records_to_txs(chunk, &to_align_tx, &to_output_tx)?;
            }

            Ok(())
        });
        Self {
            handle,
            to_align_rx,
            to_output_rx,
        }
    }
}
