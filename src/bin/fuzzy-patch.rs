// SPDX-License-Identifier: MIT

use fuzzy_patch::*;
use utils::Result;

use clap::Parser;

#[derive(Parser, Debug)]
pub struct Options {
    #[clap(subcommand)]
    pub command: Command,

    #[clap(flatten)]
    pub cli: cli::Options,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Show the differences between two files.
    Diff(tool::DiffArgs),
    /// Build a patch that turns one file into another.
    Make(tool::MakeArgs),
    /// Apply a patch to a file.
    Apply(tool::ApplyArgs),
}

fn do_main() -> Result<bool> {
    let args = Options::parse();
    let mut output = cli::Output::open(&args.cli)?;
    let out = output.writer();

    match &args.command {
        Command::Diff(diff_args) => tool::diff_files(diff_args, out).map(|()| true),
        Command::Make(make_args) => tool::make_patch(make_args, out).map(|()| true),
        Command::Apply(apply_args) => tool::apply_patch(apply_args, out),
    }
}

fn main() {
    match do_main() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            println!("{}", err);
            std::process::exit(1);
        }
    }
}
