use std::path::Path;

/// Buffer size for file readers.
pub const BUFFER_SIZE: usize = 1024 * 1024;

/// The set of file extensions to treat as GZIPPED
const GZIP_EXTENSIONS: [&str; 2] = ["gz", "bgz"];

/// The set of file extensions to treat as FASTQ
const FASTQ_EXTENSIONS: [&str; 2] = ["fastq", "fq"];

/// The set of file extensions to treat as FASTA
const FASTA_EXTENSIONS: [&str; 4] = ["fasta", "fa", "fna", "faa"];

/// Returns true if the path's last extension is one of `extensions`
fn has_extension<P: AsRef<Path>>(p: &P, extensions: &[&str]) -> bool {
    p.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| extensions.contains(&ext))
}

/// The path with any GZIP extension removed.
fn strip_gzip_extension<P: AsRef<Path>>(p: &P) -> &Path {
    let path = p.as_ref();
    if is_gzip_path(&path) {
        path.file_stem().map_or(path, Path::new)
    } else {
        path
    }
}

/// Returns true if the path ends with a recognized GZIP file extension
pub fn is_gzip_path<P: AsRef<Path>>(p: &P) -> bool {
    has_extension(p, &GZIP_EXTENSIONS)
}

/// Returns true if the path has a FASTQ extension, possibly followed by a GZIP extension
pub fn is_fastq_path<P: AsRef<Path>>(p: &P) -> bool {
    has_extension(&strip_gzip_extension(p), &FASTQ_EXTENSIONS)
}

/// Returns true if the path has a FASTA extension, possibly followed by a GZIP extension
pub fn is_fasta_path<P: AsRef<Path>>(p: &P) -> bool {
    has_extension(&strip_gzip_extension(p), &FASTA_EXTENSIONS)
}
