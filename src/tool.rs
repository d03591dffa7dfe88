// SPDX-License-Identifier: MIT

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use termcolor::WriteColor;

use crate::diff;
use crate::diff_color;
use crate::patch;
use crate::utils::{self, Result};

#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// The original file.
    pub old: PathBuf,

    /// The changed file.
    pub new: PathBuf,

    /// Print patch text instead of a colored character diff.
    #[clap(long)]
    pub patch: bool,

    /// Keep the minimal edit script without the semantic cleanup.
    #[clap(long)]
    pub raw: bool,
}

pub fn diff_files(args: &DiffArgs, out: &mut dyn WriteColor) -> Result<()> {
    let old = utils::read_text(&args.old)?;
    let new = utils::read_text(&args.new)?;

    let config = diff::DiffConfig::default();
    let mut diffs = diff::diff_main(&old, &new, true, &config);
    if !args.raw {
        diff::cleanup_semantic(&mut diffs);
    }

    if args.patch {
        let patches = patch::patch_make_from_diffs(&old, &diffs, &patch::PatchConfig::default());
        write!(out, "{}", patch::patch_to_text(&patches))?;
    } else {
        diff_color::write_diff(out, &diffs)?;
    }
    Ok(())
}

#[derive(Parser, Debug)]
pub struct MakeArgs {
    /// The original file.
    pub old: PathBuf,

    /// The changed file.
    pub new: PathBuf,
}

pub fn make_patch(args: &MakeArgs, out: &mut dyn WriteColor) -> Result<()> {
    let old = utils::read_text(&args.old)?;
    let new = utils::read_text(&args.new)?;

    let patches = patch::patch_make(&old, &new, &patch::PatchConfig::default());
    write!(out, "{}", patch::patch_to_text(&patches))?;
    Ok(())
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// The patch file, as produced by `make`.
    pub patch: PathBuf,

    /// The file to apply the patch to.
    pub base: PathBuf,
}

/// Apply a patch and write the result. Returns whether every hunk applied;
/// hunks that could not be placed are reported on stderr.
pub fn apply_patch(args: &ApplyArgs, out: &mut dyn WriteColor) -> Result<bool> {
    let patch_text = utils::read_text(&args.patch)?;
    let base = utils::read_text(&args.base)?;

    let patches = patch::patch_from_text(&patch_text)?;
    let (result, applied) = patch::patch_apply(&patches, &base, &patch::PatchConfig::default());
    write!(out, "{}", result)?;

    for (idx, ok) in applied.iter().enumerate() {
        if !ok {
            eprintln!("hunk #{} failed to apply", idx + 1);
        }
    }
    Ok(applied.iter().all(|&ok| ok))
}
