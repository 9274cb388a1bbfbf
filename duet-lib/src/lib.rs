#![deny(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]

pub mod align;
pub mod matrix;
pub mod util;
