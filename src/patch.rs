// SPDX-License-Identifier: MIT

///! Context-bearing patches: build them from a diff, serialize and parse the
///! classic hunk text format, and re-apply them against a base text that may
///! have drifted since the patch was made.
///!
///! A [`Patch`] is self-contained: applying it needs only the patch and the
///! current base text. Application first tries the recorded offset, then
///! falls back to a fuzzy search for the patch's context. A patch that cannot
///! be located is reported as failed in the result flags instead of aborting
///! the whole application.
///!
///! Coordinates and lengths count characters, not bytes.

use std::collections::VecDeque;
use std::fmt;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::bitap::{self, MatchConfig, MAX_BITS};
use crate::diff::common::{find_from, rfind_upto};
use crate::diff::{self, DiffConfig, Difference, EditType};
use crate::utils::{err_from_str, try_forward, Result};

#[derive(Debug, Clone)]
pub struct PatchConfig {
    /// Number of context characters kept around each edit.
    pub margin: usize,

    /// When a long patch matches only loosely, the fraction of its pattern
    /// that may be missing before the patch is rejected.
    pub delete_threshold: f64,

    pub diff: DiffConfig,
    pub matcher: MatchConfig,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            margin: 4,
            delete_threshold: 0.5,
            diff: DiffConfig::default(),
            matcher: MatchConfig::default(),
        }
    }
}

/// One independently applicable fragment of a diff, with enough surrounding
/// context to relocate it in a drifted base text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub diffs: Vec<Difference>,
    /// Location and extent of the fragment in source coordinates.
    pub start1: usize,
    pub length1: usize,
    /// Location and extent of the fragment in target coordinates.
    pub start2: usize,
    pub length2: usize,
}

fn coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, length),
    }
}

impl fmt::Display for Patch {
    /// Render the patch in the classic hunk format, e.g.
    /// `@@ -382,8 +481,9 @@`. Starts are 1-based; a length of one is implied
    /// by a bare start and a zero length keeps the 0-based start.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            coords(self.start1, self.length1),
            coords(self.start2, self.length2)
        )?;
        for diff in &self.diffs {
            let sign = match diff.edit {
                EditType::Insert => '+',
                EditType::Delete => '-',
                EditType::Equal => ' ',
            };
            writeln!(f, "{}{}", sign, encode_uri(&diff.text))?;
        }
        Ok(())
    }
}

/// Characters left untouched by [`encode_uri`]. This is the encoding the
/// wider patch-text ecosystem produces, so it is fixed.
fn is_literal(c: char) -> bool {
    c.is_ascii_alphanumeric() || " -_.~!*'();/?:@&=+$,#".contains(c)
}

fn encode_uri(text: &str) -> String {
    use fmt::Write;

    let mut out = String::new();
    for c in text.chars() {
        if is_literal(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for &byte in c.encode_utf8(&mut buf).as_bytes() {
                write!(out, "%{:02X}", byte).unwrap();
            }
        }
    }
    out
}

fn decode_uri(text: &str) -> Result<String> {
    let mut bytes = Vec::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            let hi = chars.next().and_then(|c| c.to_digit(16));
            let lo = chars.next().and_then(|c| c.to_digit(16));
            let (Some(hi), Some(lo)) = (hi, lo) else {
                return Err(err_from_str("invalid percent escape"));
            };
            bytes.push((hi * 16 + lo) as u8);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    Ok(String::from_utf8(bytes)?)
}

/// Serialize a patch set. Inverse of [`patch_from_text`].
pub fn patch_to_text(patches: &[Patch]) -> String {
    patches.iter().join("")
}

lazy_static! {
    static ref PATCH_HEADER: Regex =
        Regex::new(r"^@@ -([0-9]+),?([0-9]*) \+([0-9]+),?([0-9]*) @@$").unwrap();
}

fn parse_coords(start: &str, length: &str) -> Result<(usize, usize)> {
    let start: usize = start.parse()?;
    Ok(match length {
        "" => (
            start
                .checked_sub(1)
                .ok_or_else(|| err_from_str("invalid start coordinate"))?,
            1,
        ),
        "0" => (start, 0),
        _ => (
            start
                .checked_sub(1)
                .ok_or_else(|| err_from_str("invalid start coordinate"))?,
            length.parse()?,
        ),
    })
}

/// Parse a textual patch set. Any malformed header, unknown line prefix or
/// bad escape fails the whole parse; there are no partial results.
pub fn patch_from_text(text: &str) -> Result<Vec<Patch>> {
    let mut patches: Vec<Patch> = Vec::new();
    let lines: Vec<&str> = text.split('\n').collect();
    let mut pointer = 0;
    while pointer < lines.len() {
        let line = lines[pointer];
        if line.is_empty() {
            pointer += 1;
            continue;
        }
        let patch = try_forward(
            || -> Result<Patch> {
                let captures = PATCH_HEADER
                    .captures(line)
                    .ok_or_else(|| err_from_str("invalid patch header"))?;
                let (start1, length1) = parse_coords(&captures[1], &captures[2])?;
                let (start2, length2) = parse_coords(&captures[3], &captures[4])?;
                Ok(Patch {
                    diffs: Vec::new(),
                    start1,
                    length1,
                    start2,
                    length2,
                })
            },
            || format!("line {}", pointer + 1),
        )?;
        patches.push(patch);
        pointer += 1;

        while pointer < lines.len() {
            let line = lines[pointer];
            if line.is_empty() {
                pointer += 1;
                continue;
            }
            if line.starts_with('@') {
                break;
            }
            let diff = try_forward(
                || -> Result<Difference> {
                    let mut chars = line.chars();
                    let sign = chars.next().unwrap();
                    let edit = match sign {
                        '+' => EditType::Insert,
                        '-' => EditType::Delete,
                        ' ' => EditType::Equal,
                        _ => return Err(err_from_str("invalid patch mode")),
                    };
                    Ok(Difference::new(edit, decode_uri(chars.as_str())?))
                },
                || format!("line {}", pointer + 1),
            )?;
            patches.last_mut().unwrap().diffs.push(diff);
            pointer += 1;
        }
    }
    Ok(patches)
}

/// Grow the context of `patch` until it is unique within `text` (or as close
/// to unique as the matcher's window allows), then add one extra margin on
/// both sides.
fn add_context(patch: &mut Patch, text: &[char], margin: usize) {
    if text.is_empty() {
        return;
    }
    let mut pattern: &[char] = &text[patch.start2..patch.start2 + patch.length1];
    let mut padding = 0;
    while find_from(text, pattern, 0) != rfind_upto(text, pattern, text.len())
        && pattern.len() < MAX_BITS.saturating_sub(2 * margin)
    {
        padding += margin;
        let begin = patch.start2.saturating_sub(padding);
        let end = (patch.start2 + patch.length1 + padding).min(text.len());
        pattern = &text[begin..end];
    }
    padding += margin;

    let begin = patch.start2.saturating_sub(padding);
    let prefix: String = text[begin..patch.start2].iter().collect();
    let prefix_len = patch.start2 - begin;
    if !prefix.is_empty() {
        patch.diffs.insert(0, Difference::new(EditType::Equal, prefix));
    }
    let end = (patch.start2 + patch.length1 + padding).min(text.len());
    let suffix: String = text[patch.start2 + patch.length1..end].iter().collect();
    let suffix_len = end - (patch.start2 + patch.length1);
    if !suffix.is_empty() {
        patch.diffs.push(Difference::new(EditType::Equal, suffix));
    }

    patch.start1 = patch.start1.saturating_sub(prefix_len);
    patch.start2 -= prefix_len;
    patch.length1 += prefix_len + suffix_len;
    patch.length2 += prefix_len + suffix_len;
}

/// Grow the context of `patch` against the full source text `text`.
pub fn patch_add_context(patch: &mut Patch, text: &str, margin: usize) {
    let text: Vec<char> = text.chars().collect();
    add_context(patch, &text, margin);
}

/// Diff two texts and carve the result into patches.
pub fn patch_make(a: &str, b: &str, config: &PatchConfig) -> Vec<Patch> {
    let mut diffs = diff::diff_main(a, b, true, &config.diff);
    if diffs.len() > 2 {
        diff::cleanup_semantic(&mut diffs);
        diff::cleanup_efficiency(&mut diffs, config.diff.edit_cost);
    }
    patch_make_from_diffs(a, &diffs, config)
}

/// Carve an existing diff of `a` into patches.
pub fn patch_make_from_diffs(a: &str, diffs: &[Difference], config: &PatchConfig) -> Vec<Patch> {
    let mut patches = Vec::new();
    if diffs.is_empty() {
        return patches;
    }

    let mut patch = Patch::default();
    let mut char_count1 = 0;
    let mut char_count2 = 0;
    // Two working copies of the source: the text as of the last committed
    // patch, and the text with all edits seen so far applied. Patch start2
    // coordinates are relative to the former.
    let mut prepatch: Vec<char> = a.chars().collect();
    let mut postpatch: Vec<char> = prepatch.clone();

    for (idx, diff) in diffs.iter().enumerate() {
        let diff_len = diff.char_len();
        if patch.diffs.is_empty() && diff.edit != EditType::Equal {
            // A new patch starts here.
            patch.start1 = char_count1;
            patch.start2 = char_count2;
        }
        match diff.edit {
            EditType::Insert => {
                patch.diffs.push(diff.clone());
                patch.length2 += diff_len;
                postpatch.splice(char_count2..char_count2, diff.text.chars());
            }
            EditType::Delete => {
                patch.diffs.push(diff.clone());
                patch.length1 += diff_len;
                postpatch.drain(char_count2..char_count2 + diff_len);
            }
            EditType::Equal => {
                if diff_len <= 2 * config.margin
                    && !patch.diffs.is_empty()
                    && idx != diffs.len() - 1
                {
                    // Small equality within a patch.
                    patch.diffs.push(diff.clone());
                    patch.length1 += diff_len;
                    patch.length2 += diff_len;
                }
                if diff_len >= 2 * config.margin && !patch.diffs.is_empty() {
                    // The equality is large enough to close the patch. Later
                    // patches roll their context over the text with the
                    // earlier patches already applied, so start2 coordinates
                    // are relative to the updated text.
                    add_context(&mut patch, &prepatch, config.margin);
                    patches.push(std::mem::take(&mut patch));
                    prepatch = postpatch.clone();
                }
            }
        }
        if diff.edit != EditType::Insert {
            char_count1 += diff_len;
        }
        if diff.edit != EditType::Delete {
            char_count2 += diff_len;
        }
    }
    if !patch.diffs.is_empty() {
        add_context(&mut patch, &prepatch, config.margin);
        patches.push(patch);
    }

    patches
}

/// Pad both ends of the first and last patch with a sentinel string so that
/// edits touching the very edges of the text still have context to match on.
/// Returns the padding for the caller to strip afterwards.
pub fn patch_add_padding(patches: &mut [Patch], config: &PatchConfig) -> String {
    let pad_len = config.margin;
    let padding: String = (1..=pad_len as u32)
        .map(|x| char::from_u32(x).unwrap())
        .collect();
    if patches.is_empty() {
        return padding;
    }

    for patch in patches.iter_mut() {
        patch.start1 += pad_len;
        patch.start2 += pad_len;
    }

    // Pad the front of the first patch.
    let first = patches.first_mut().unwrap();
    if first.diffs.first().map(|diff| diff.edit) != Some(EditType::Equal) {
        first
            .diffs
            .insert(0, Difference::new(EditType::Equal, padding.as_str()));
        first.start1 -= pad_len;
        first.start2 -= pad_len;
        first.length1 += pad_len;
        first.length2 += pad_len;
    } else {
        let head_len = first.diffs[0].char_len();
        if pad_len > head_len {
            // Grow the first equality backwards into the padding.
            let extra = pad_len - head_len;
            let extra_text: String = padding.chars().skip(head_len).collect();
            first.diffs[0].text = format!("{}{}", extra_text, first.diffs[0].text);
            first.start1 -= extra;
            first.start2 -= extra;
            first.length1 += extra;
            first.length2 += extra;
        }
    }

    // Pad the end of the last patch.
    let last = patches.last_mut().unwrap();
    if last.diffs.last().map(|diff| diff.edit) != Some(EditType::Equal) {
        last.diffs
            .push(Difference::new(EditType::Equal, padding.as_str()));
        last.length1 += pad_len;
        last.length2 += pad_len;
    } else {
        let tail_len = last.diffs.last().unwrap().char_len();
        if pad_len > tail_len {
            let extra = pad_len - tail_len;
            let extra_text: String = padding.chars().take(extra).collect();
            last.diffs.last_mut().unwrap().text.push_str(&extra_text);
            last.length1 += extra;
            last.length2 += extra;
        }
    }

    padding
}

/// Split any patch whose source span exceeds the matcher's window into
/// smaller patches with re-derived context, so that application never has to
/// search for an oversized pattern.
pub fn patch_split_max(patches: &mut Vec<Patch>, config: &PatchConfig) {
    let patch_size = MAX_BITS;
    let margin = config.margin;

    let mut out: Vec<Patch> = Vec::new();
    for mut bigpatch in std::mem::take(patches) {
        if bigpatch.length1 <= patch_size {
            out.push(bigpatch);
            continue;
        }

        let mut start1 = bigpatch.start1;
        let mut start2 = bigpatch.start2;
        let mut precontext: Vec<char> = Vec::new();
        let mut bigdiffs: VecDeque<Difference> = bigpatch.diffs.drain(..).collect();

        while !bigdiffs.is_empty() {
            let mut patch = Patch::default();
            let mut empty = true;
            patch.start1 = start1 - precontext.len();
            patch.start2 = start2 - precontext.len();
            if !precontext.is_empty() {
                patch.length1 = precontext.len();
                patch.length2 = precontext.len();
                patch
                    .diffs
                    .push(Difference::new(EditType::Equal, precontext.iter().collect::<String>()));
            }

            while !bigdiffs.is_empty() && patch.length1 < patch_size - margin {
                let edit = bigdiffs[0].edit;
                let diff_len = bigdiffs[0].char_len();
                match edit {
                    EditType::Insert => {
                        // Insertions are harmless.
                        patch.length2 += diff_len;
                        start2 += diff_len;
                        patch.diffs.push(bigdiffs.pop_front().unwrap());
                        empty = false;
                    }
                    EditType::Delete
                        if patch.diffs.len() == 1
                            && patch.diffs[0].edit == EditType::Equal
                            && diff_len > 2 * patch_size =>
                    {
                        // An oversized deletion is taken whole rather than
                        // shredded across many patches.
                        patch.length1 += diff_len;
                        start1 += diff_len;
                        patch.diffs.push(bigdiffs.pop_front().unwrap());
                        empty = false;
                    }
                    _ => {
                        // Deletion or equality; take as much as fits.
                        let take = diff_len.min(patch_size - patch.length1 - margin);
                        let taken: String = bigdiffs[0].text.chars().take(take).collect();
                        patch.length1 += take;
                        start1 += take;
                        if edit == EditType::Equal {
                            patch.length2 += take;
                            start2 += take;
                        } else {
                            empty = false;
                        }
                        patch.diffs.push(Difference::new(edit, taken));
                        if take == diff_len {
                            bigdiffs.pop_front();
                        } else {
                            let rest: String = bigdiffs[0].text.chars().skip(take).collect();
                            bigdiffs[0].text = rest;
                        }
                    }
                }
            }

            // The head context for the next patch piece.
            let text2 = diff::text2(&patch.diffs);
            precontext = text2.chars().collect();
            let keep = precontext.len().saturating_sub(margin);
            precontext.drain(..keep);

            // The tail context for this piece.
            let postcontext: String = diff::text1(bigdiffs.make_contiguous())
                .chars()
                .take(margin)
                .collect();
            if !postcontext.is_empty() {
                let post_len = postcontext.chars().count();
                patch.length1 += post_len;
                patch.length2 += post_len;
                if patch.diffs.last().map(|diff| diff.edit) == Some(EditType::Equal) {
                    patch.diffs.last_mut().unwrap().text.push_str(&postcontext);
                } else {
                    patch.diffs.push(Difference::new(EditType::Equal, postcontext));
                }
            }

            if !empty {
                out.push(patch);
            }
        }
    }
    *patches = out;
}

/// Apply `patches` to `text`, as far as possible. Returns the patched text
/// and one flag per patch telling whether it could be applied. A failed patch
/// is skipped, never an error.
pub fn patch_apply(patches: &[Patch], text: &str, config: &PatchConfig) -> (String, Vec<bool>) {
    if patches.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let mut patches = patches.to_vec();
    let null_padding = patch_add_padding(&mut patches, config);
    let mut text: Vec<char> = null_padding
        .chars()
        .chain(text.chars())
        .chain(null_padding.chars())
        .collect();
    patch_split_max(&mut patches, config);

    // delta keeps track of the offset between the expected and actual
    // location of the previous patch. If there are patches expected at
    // positions 10 and 20, but the first was found at 12, delta is 2 and the
    // second patch has an effective expected position of 22.
    let mut delta: isize = 0;
    let mut results = vec![false; patches.len()];
    for (x, patch) in patches.iter().enumerate() {
        let expected_loc = (patch.start2 as isize + delta).max(0) as usize;
        let text1: Vec<char> = diff::text1(&patch.diffs).chars().collect();
        let mut start_loc;
        let mut end_loc = None;
        if text1.len() > MAX_BITS {
            // The pattern is wider than the matcher's window: anchor on its
            // first and last words instead.
            start_loc = bitap::match_chars(&text, &text1[..MAX_BITS], expected_loc, &config.matcher);
            if start_loc.is_some() {
                end_loc = bitap::match_chars(
                    &text,
                    &text1[text1.len() - MAX_BITS..],
                    expected_loc + text1.len() - MAX_BITS,
                    &config.matcher,
                );
                if end_loc.is_none() || start_loc >= end_loc {
                    // Can't find valid trailing context. Drop this patch.
                    start_loc = None;
                }
            }
        } else {
            start_loc = bitap::match_chars(&text, &text1, expected_loc, &config.matcher);
        }

        let Some(start_loc) = start_loc else {
            // No match found. Subtract the delta this patch would have
            // contributed.
            delta -= patch.length2 as isize - patch.length1 as isize;
            continue;
        };

        results[x] = true;
        delta = start_loc as isize - expected_loc as isize;
        let found: Vec<char> = match end_loc {
            Some(end_loc) => {
                let end = (end_loc + MAX_BITS).min(text.len());
                text[start_loc..end].to_vec()
            }
            None => {
                let end = (start_loc + text1.len()).min(text.len());
                text[start_loc..end].to_vec()
            }
        };

        if text1 == found {
            // Perfect match; splice the new text in directly.
            let replacement: Vec<char> = diff::text2(&patch.diffs).chars().collect();
            text.splice(start_loc..start_loc + text1.len(), replacement);
            continue;
        }

        // Imperfect match; diff what was expected against what was found and
        // stitch the patch through it.
        let expected_text: String = text1.iter().collect();
        let found_text: String = found.iter().collect();
        let mut diffs = diff::diff_main(&expected_text, &found_text, false, &config.diff);
        if text1.len() > MAX_BITS
            && diff::levenshtein(&diffs) as f64 / text1.len() as f64 > config.delete_threshold
        {
            // The end points match but the content is too different.
            results[x] = false;
            continue;
        }
        diff::cleanup_semantic_lossless(&mut diffs);
        let mut index1 = 0;
        for diff in &patch.diffs {
            if diff.edit != EditType::Equal {
                let index2 = diff::x_index(&diffs, index1);
                match diff.edit {
                    EditType::Insert => {
                        let insertion: Vec<char> = diff.text.chars().collect();
                        text.splice(start_loc + index2..start_loc + index2, insertion);
                    }
                    EditType::Delete => {
                        let del_end = diff::x_index(&diffs, index1 + diff.char_len());
                        text.drain(start_loc + index2..start_loc + del_end);
                    }
                    EditType::Equal => {}
                }
            }
            if diff.edit != EditType::Delete {
                index1 += diff.char_len();
            }
        }
    }

    // Strip the padding off.
    let pad_len = null_padding.chars().count();
    let result: String = text[pad_len..text.len() - pad_len].iter().collect();
    (result, results)
}
