mod aligners;
mod alignment;
pub mod io;
mod traceback;

pub use aligners::{
    constants::{AlignmentMode, Step},
    global::global,
    local::local,
    Aligner, Builder, Options, TargetHit,
};
pub use alignment::Alignment;
