use anyhow::Result;
use clap::Parser;
use duet::util::version::built_info;
use env_logger::Env;
use log::error;
use std::process::exit;

pub mod commands;

use commands::{align::Align, command::Command};
use enum_dispatch::enum_dispatch;

#[derive(Parser, Debug)]
#[command(version = built_info::VERSION.as_str(), about = "Pairwise global and local sequence alignment")]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[enum_dispatch(Command)]
#[derive(Parser, Debug)]
#[command(version = built_info::VERSION.as_str())]
enum Subcommand {
    Align(Align),
}

fn run(args: &Args) -> Result<()> {
    args.subcommand.execute()
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args: Args = Args::parse();
    if let Err(err) = run(&args) {
        error!("{:#}", err);
        exit(1);
    }
}
