pub mod dna;
pub mod io;
pub mod target_seq;
pub mod version;
