use anyhow::Result;
use clap::builder::PossibleValue;
use enum_dispatch::enum_dispatch;
use std::{fmt::Display, str::FromStr};

/// A `duet` subcommand.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self) -> Result<()>;
}

/// An option whose values are a fixed set of variants, listed in `--help` by their display names.
pub trait ValueEnum: Display + FromStr + Sized + 'static {
    fn variants() -> &'static [Self];

    fn possible_values() -> Vec<PossibleValue> {
        Self::variants()
            .iter()
            .map(|variant| PossibleValue::new(variant.to_string()))
            .collect()
    }
}
