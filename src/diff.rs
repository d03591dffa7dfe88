// SPDX-License-Identifier: MIT

///! Compute edit scripts between two texts.
///!
///! [`diff_main`] produces an ordered sequence of [`Difference`] records whose
///! equal-plus-delete parts reconstruct the first input and whose
///! equal-plus-insert parts reconstruct the second. The search runs over token
///! sequences (characters, or interned lines for large inputs) and is bounded
///! by a cooperative wall-clock deadline: on expiry it returns the best edit
///! script found so far instead of failing.
///!
///! The cleanup passes trade minimality for readability. `cleanup_semantic`
///! moves edit boundaries to human-meaningful edges, `cleanup_efficiency`
///! drops equalities too small to be worth the operational overhead of the
///! surrounding edits, and `cleanup_merge` canonicalizes the sequence so no
///! two adjacent records share an operation.

use std::time::{Duration, Instant};

pub(crate) mod common;
mod linemap;
mod myers;

pub use common::{common_overlap, common_prefix, common_suffix, half_match, HalfMatch};
pub use linemap::LineMap;

/// The three operations an edit script is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditType {
    Equal,
    Insert,
    Delete,
}

/// One unit of an edit script: an operation and the text segment it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub edit: EditType,
    pub text: String,
}

impl Difference {
    pub fn new(edit: EditType, text: impl Into<String>) -> Self {
        Self {
            edit,
            text: text.into(),
        }
    }

    /// Length of the covered segment in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Wall-clock budget for one diff computation. `None` removes the limit
    /// and also disables the half-match shortcut, which can return
    /// non-minimal scripts.
    pub timeout: Option<Duration>,

    /// Cost of an empty edit operation in terms of edit characters, used by
    /// [`cleanup_efficiency`].
    pub edit_cost: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(1)),
            edit_cost: 4,
        }
    }
}

/// Diff two texts.
///
/// `check_lines` enables the line-mode speedup for large inputs: both sides
/// are first diffed as sequences of whole lines, then the changed blocks are
/// re-diffed character by character.
pub fn diff_main(a: &str, b: &str, check_lines: bool, config: &DiffConfig) -> Vec<Difference> {
    let deadline = config.timeout.map(|timeout| Instant::now() + timeout);
    diff_main_deadline(a, b, check_lines, deadline)
}

/// Like [`diff_main`], but with an explicit deadline so several diffs can
/// share one budget.
pub fn diff_main_deadline(
    a: &str,
    b: &str,
    check_lines: bool,
    deadline: Option<Instant>,
) -> Vec<Difference> {
    if a == b {
        if a.is_empty() {
            return Vec::new();
        }
        return vec![Difference::new(EditType::Equal, a)];
    }

    let ta = encode_chars(a);
    let tb = encode_chars(b);
    let mut diffs: Vec<Difference> = myers::diff_tokens(&ta, &tb, check_lines, deadline)
        .into_iter()
        .map(|(edit, run)| Difference::new(edit, decode_chars(&run)))
        .collect();
    cleanup_merge(&mut diffs);
    diffs
}

fn encode_chars(text: &str) -> Vec<u32> {
    text.chars().map(|c| c as u32).collect()
}

fn decode_chars(run: &[u32]) -> String {
    run.iter().map(|&t| char::from_u32(t).unwrap()).collect()
}

/// Diff a changed region line by line: intern the lines, diff the short token
/// sequences, then re-diff each replacement block character by character to
/// repair artifacts at line boundaries.
pub(crate) fn line_mode_runs(
    a: &[u32],
    b: &[u32],
    deadline: Option<Instant>,
) -> Vec<myers::Run> {
    let a = decode_chars(a);
    let b = decode_chars(b);

    let mut map = LineMap::new();
    let ta = map.encode(&a);
    let tb = map.encode(&b);

    let mut diffs: Vec<Difference> = myers::diff_tokens(&ta, &tb, false, deadline)
        .into_iter()
        .map(|(edit, run)| Difference::new(edit, map.decode(&run)))
        .collect();

    cleanup_semantic(&mut diffs);
    rediff_replacements(&mut diffs, deadline);

    diffs
        .into_iter()
        .map(|diff| (diff.edit, encode_chars(&diff.text)))
        .collect()
}

/// Re-diff each adjacent delete-plus-insert pair character by character.
fn rediff_replacements(diffs: &mut Vec<Difference>, deadline: Option<Instant>) {
    diffs.push(Difference::new(EditType::Equal, ""));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete = String::new();
    let mut text_insert = String::new();
    while pointer < diffs.len() {
        match diffs[pointer].edit {
            EditType::Insert => {
                count_insert += 1;
                text_insert.push_str(&diffs[pointer].text);
            }
            EditType::Delete => {
                count_delete += 1;
                text_delete.push_str(&diffs[pointer].text);
            }
            EditType::Equal => {
                if count_delete >= 1 && count_insert >= 1 {
                    let start = pointer - count_delete - count_insert;
                    let sub = diff_main_deadline(&text_delete, &text_insert, false, deadline);
                    let sub_len = sub.len();
                    diffs.splice(start..pointer, sub);
                    pointer = start + sub_len;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
        pointer += 1;
    }
    diffs.pop();
}

/// Source text reconstructed from the equalities and deletions.
pub fn text1(diffs: &[Difference]) -> String {
    diffs
        .iter()
        .filter(|diff| diff.edit != EditType::Insert)
        .map(|diff| diff.text.as_str())
        .collect()
}

/// Target text reconstructed from the equalities and insertions.
pub fn text2(diffs: &[Difference]) -> String {
    diffs
        .iter()
        .filter(|diff| diff.edit != EditType::Delete)
        .map(|diff| diff.text.as_str())
        .collect()
}

/// Translate a source location into the corresponding target location.
/// A location inside a deletion maps to the spot where the deletion happened.
pub fn x_index(diffs: &[Difference], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut hit = None;
    for diff in diffs {
        if diff.edit != EditType::Insert {
            chars1 += diff.char_len();
        }
        if diff.edit != EditType::Delete {
            chars2 += diff.char_len();
        }
        if chars1 > loc {
            hit = Some(diff);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }
    match hit {
        Some(diff) if diff.edit == EditType::Delete => last_chars2,
        _ => last_chars2 + (loc - last_chars1),
    }
}

/// Edit distance of a diff: the largest of insertions and deletions between
/// consecutive equalities, summed.
pub fn levenshtein(diffs: &[Difference]) -> usize {
    let mut lev = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for diff in diffs {
        match diff.edit {
            EditType::Insert => insertions += diff.char_len(),
            EditType::Delete => deletions += diff.char_len(),
            EditType::Equal => {
                lev += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    lev + insertions.max(deletions)
}

/// Byte length of the common character prefix. Always a character boundary in
/// both strings.
fn common_prefix_bytes(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Byte length of the common character suffix.
fn common_suffix_bytes(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Byte index of the `chars`-th character of `s`.
fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

/// Canonicalize an edit script: concatenate runs of the same operation, drop
/// empty segments, factor common affixes out of delete-plus-insert pairs and
/// slide single edits over neighboring equalities where that merges them.
/// Loops until a fixed point is reached.
pub fn cleanup_merge(diffs: &mut Vec<Difference>) {
    loop {
        if diffs.is_empty() {
            return;
        }

        diffs.push(Difference::new(EditType::Equal, ""));
        let mut pointer = 0;
        let mut count_delete = 0;
        let mut count_insert = 0;
        let mut text_delete = String::new();
        let mut text_insert = String::new();
        while pointer < diffs.len() {
            match diffs[pointer].edit {
                EditType::Insert => {
                    count_insert += 1;
                    text_insert.push_str(&diffs[pointer].text);
                    pointer += 1;
                }
                EditType::Delete => {
                    count_delete += 1;
                    text_delete.push_str(&diffs[pointer].text);
                    pointer += 1;
                }
                EditType::Equal => {
                    if count_delete + count_insert > 1 {
                        if count_delete != 0 && count_insert != 0 {
                            // Factor out any common prefix.
                            let prefix = common_prefix_bytes(&text_insert, &text_delete);
                            if prefix != 0 {
                                let start = pointer - count_delete - count_insert;
                                if start > 0 && diffs[start - 1].edit == EditType::Equal {
                                    diffs[start - 1].text.push_str(&text_insert[..prefix]);
                                } else {
                                    diffs.insert(
                                        0,
                                        Difference::new(EditType::Equal, &text_insert[..prefix]),
                                    );
                                    pointer += 1;
                                }
                                text_insert.drain(..prefix);
                                text_delete.drain(..prefix);
                            }
                            // Factor out any common suffix.
                            let suffix = common_suffix_bytes(&text_insert, &text_delete);
                            if suffix != 0 {
                                let cut = text_insert.len() - suffix;
                                diffs[pointer].text.insert_str(0, &text_insert[cut..]);
                                text_insert.truncate(cut);
                                text_delete.truncate(text_delete.len() - suffix);
                            }
                        }
                        // Replace the run of edits with at most one of each.
                        let start = pointer - count_delete - count_insert;
                        let mut merged = Vec::new();
                        if !text_delete.is_empty() {
                            merged.push(Difference::new(EditType::Delete, text_delete.as_str()));
                        }
                        if !text_insert.is_empty() {
                            merged.push(Difference::new(EditType::Insert, text_insert.as_str()));
                        }
                        let merged_len = merged.len();
                        diffs.splice(start..pointer, merged);
                        pointer = start + merged_len + 1;
                    } else if pointer != 0 && diffs[pointer - 1].edit == EditType::Equal {
                        // Merge this equality into the previous one.
                        let text = std::mem::take(&mut diffs[pointer].text);
                        diffs[pointer - 1].text.push_str(&text);
                        diffs.remove(pointer);
                    } else {
                        pointer += 1;
                    }
                    count_insert = 0;
                    count_delete = 0;
                    text_delete.clear();
                    text_insert.clear();
                }
            }
        }
        if diffs
            .last()
            .map(|diff| diff.text.is_empty())
            .unwrap_or(false)
        {
            diffs.pop();
        }

        // Second pass: slide single edits surrounded by equalities over to
        // one side when that lets two equalities merge.
        let mut changes = false;
        let mut pointer = 1;
        while pointer + 1 < diffs.len() {
            if diffs[pointer - 1].edit == EditType::Equal
                && diffs[pointer + 1].edit == EditType::Equal
            {
                let prev_text = diffs[pointer - 1].text.clone();
                let next_text = diffs[pointer + 1].text.clone();
                if diffs[pointer].text.ends_with(&prev_text) {
                    let core_len = diffs[pointer].text.len() - prev_text.len();
                    let core = diffs[pointer].text[..core_len].to_string();
                    diffs[pointer].text = format!("{}{}", prev_text, core);
                    diffs[pointer + 1].text = format!("{}{}", prev_text, next_text);
                    diffs.remove(pointer - 1);
                    changes = true;
                } else if diffs[pointer].text.starts_with(&next_text) {
                    diffs[pointer - 1].text.push_str(&next_text);
                    let core = diffs[pointer].text[next_text.len()..].to_string();
                    diffs[pointer].text = format!("{}{}", core, next_text);
                    diffs.remove(pointer + 1);
                    changes = true;
                }
            }
            pointer += 1;
        }

        if !changes {
            return;
        }
    }
}

/// Reduce the number of edits by eliminating semantically trivial equalities,
/// then shift the remaining boundaries to natural edges and split overlapping
/// delete-plus-insert pairs.
pub fn cleanup_semantic(diffs: &mut Vec<Difference>) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0;
    // Number of characters changed before and after the candidate equality.
    let mut length_insertions1 = 0;
    let mut length_deletions1 = 0;
    let mut length_insertions2 = 0;
    let mut length_deletions2 = 0;
    while pointer < diffs.len() {
        if diffs[pointer].edit == EditType::Equal {
            equalities.push(pointer);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(diffs[pointer].text.clone());
            pointer += 1;
        } else {
            if diffs[pointer].edit == EditType::Insert {
                length_insertions2 += diffs[pointer].char_len();
            } else {
                length_deletions2 += diffs[pointer].char_len();
            }
            // The equality is a candidate when it is no larger than the edits
            // on either side of it.
            let eliminate = last_equality.as_ref().is_some_and(|eq| {
                let len = eq.chars().count();
                len <= length_insertions1.max(length_deletions1)
                    && len <= length_insertions2.max(length_deletions2)
            });
            if eliminate {
                let eq_index = *equalities.last().unwrap();
                let eq_text = last_equality.take().unwrap();
                // Duplicate the equality as a deletion and turn the original
                // into an insertion.
                diffs[eq_index] = Difference::new(EditType::Insert, eq_text.as_str());
                diffs.insert(eq_index, Difference::new(EditType::Delete, eq_text));
                equalities.pop();
                // The previous equality needs to be reevaluated as well.
                equalities.pop();
                pointer = equalities.last().map(|&idx| idx + 1).unwrap_or(0);
                length_insertions1 = 0;
                length_deletions1 = 0;
                length_insertions2 = 0;
                length_deletions2 = 0;
                changes = true;
            } else {
                pointer += 1;
            }
        }
    }
    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);

    // Split overlapping delete-plus-insert pairs on their shared fragment.
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].edit == EditType::Delete && diffs[pointer].edit == EditType::Insert {
            let deletion = diffs[pointer - 1].text.clone();
            let insertion = diffs[pointer].text.clone();
            let overlap1 = common_overlap(&deletion, &insertion);
            let overlap2 = common_overlap(&insertion, &deletion);
            let del_len = deletion.chars().count();
            let ins_len = insertion.chars().count();
            if overlap1 >= overlap2 {
                if overlap1 * 2 >= del_len || overlap1 * 2 >= ins_len {
                    let ins_cut = byte_index(&insertion, overlap1);
                    let del_cut = byte_index(&deletion, del_len - overlap1);
                    diffs.insert(
                        pointer,
                        Difference::new(EditType::Equal, &insertion[..ins_cut]),
                    );
                    diffs[pointer - 1].text = deletion[..del_cut].to_string();
                    diffs[pointer + 1].text = insertion[ins_cut..].to_string();
                    pointer += 1;
                }
            } else if overlap2 * 2 >= del_len || overlap2 * 2 >= ins_len {
                // Reverse overlap: the insertion's tail matches the
                // deletion's head. Swap the pair around the equality.
                let del_cut = byte_index(&deletion, overlap2);
                let ins_cut = byte_index(&insertion, ins_len - overlap2);
                diffs.insert(
                    pointer,
                    Difference::new(EditType::Equal, &deletion[..del_cut]),
                );
                diffs[pointer - 1] =
                    Difference::new(EditType::Insert, insertion[..ins_cut].to_string());
                diffs[pointer + 1] =
                    Difference::new(EditType::Delete, deletion[del_cut..].to_string());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Shift edit boundaries so they fall on word, sentence or line edges where
/// that is possible without changing the texts the script produces.
pub fn cleanup_semantic_lossless(diffs: &mut Vec<Difference>) {
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].edit == EditType::Equal && diffs[pointer + 1].edit == EditType::Equal
        {
            let mut equality1 = diffs[pointer - 1].text.clone();
            let mut edit = diffs[pointer].text.clone();
            let mut equality2 = diffs[pointer + 1].text.clone();

            // Shift the edit as far left as possible.
            let common_offset = common_suffix_bytes(&equality1, &edit);
            if common_offset != 0 {
                let common_string = edit[edit.len() - common_offset..].to_string();
                equality1.truncate(equality1.len() - common_offset);
                edit = format!("{}{}", common_string, &edit[..edit.len() - common_offset]);
                equality2 = format!("{}{}", common_string, equality2);
            }

            // Step character by character to the right, keeping the best
            // scoring split. Ties go to the rightmost candidate.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score =
                semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            loop {
                let (Some(edit_first), Some(eq2_first)) =
                    (edit.chars().next(), equality2.chars().next())
                else {
                    break;
                };
                if edit_first != eq2_first {
                    break;
                }
                equality1.push(edit_first);
                edit.remove(0);
                edit.push(eq2_first);
                equality2.remove(0);
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].text != best_equality1 {
                if !best_equality1.is_empty() {
                    diffs[pointer - 1].text = best_equality1;
                } else {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                }
                diffs[pointer].text = best_edit;
                if !best_equality2.is_empty() {
                    diffs[pointer + 1].text = best_equality2;
                } else {
                    diffs.remove(pointer + 1);
                    pointer -= 1;
                }
            }
        }
        pointer += 1;
    }
}

/// Score a split between `one` and `two`: 6 is an edge of the text, 5 a blank
/// line, 4 a line break, 3 the end of a sentence, 2 whitespace, 1 other
/// non-alphanumeric characters, 0 a split inside a word.
fn semantic_score(one: &str, two: &str) -> usize {
    let (Some(char1), Some(char2)) = (one.chars().next_back(), two.chars().next()) else {
        return 6;
    };

    let non_alphanumeric1 = !char1.is_alphanumeric();
    let non_alphanumeric2 = !char2.is_alphanumeric();
    let whitespace1 = non_alphanumeric1 && char1.is_whitespace();
    let whitespace2 = non_alphanumeric2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\n' || char1 == '\r');
    let line_break2 = whitespace2 && (char2 == '\n' || char2 == '\r');
    let blank_line1 = line_break1 && (one.ends_with("\n\n") || one.ends_with("\n\r\n"));
    let blank_line2 = line_break2
        && (two.starts_with("\n\n")
            || two.starts_with("\n\r\n")
            || two.starts_with("\r\n\n")
            || two.starts_with("\r\n\r\n"));

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alphanumeric1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alphanumeric1 || non_alphanumeric2 {
        1
    } else {
        0
    }
}

/// Remove equalities that are smaller than the operational cost of keeping
/// the surrounding edits separate.
pub fn cleanup_efficiency(diffs: &mut Vec<Difference>, edit_cost: usize) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0;
    // Whether there is an insertion or deletion before/after the candidate.
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;
    while pointer < diffs.len() {
        if diffs[pointer].edit == EditType::Equal {
            if diffs[pointer].char_len() < edit_cost && (post_ins || post_del) {
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[pointer].text.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
            pointer += 1;
        } else {
            if diffs[pointer].edit == EditType::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }
            /*
             * Five types to be split:
             * <ins>A</ins><del>B</del>XY<ins>C</ins><del>D</del>
             * <ins>A</ins>X<ins>C</ins><del>D</del>
             * <ins>A</ins><del>B</del>X<ins>C</ins>
             * <ins>A</del>X<ins>C</ins><del>D</del>
             * <ins>A</ins><del>B</del>X<del>C</del>
             */
            let split = last_equality.as_ref().is_some_and(|eq| {
                let sides =
                    pre_ins as usize + pre_del as usize + post_ins as usize + post_del as usize;
                (pre_ins && pre_del && post_ins && post_del)
                    || (eq.chars().count() < edit_cost / 2 && sides == 3)
            });
            if split {
                let eq_index = *equalities.last().unwrap();
                let eq_text = last_equality.take().unwrap();
                diffs[eq_index] = Difference::new(EditType::Insert, eq_text.as_str());
                diffs.insert(eq_index, Difference::new(EditType::Delete, eq_text));
                equalities.pop();
                if pre_ins && pre_del {
                    // No changes that could affect earlier entries.
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                    pointer += 1;
                } else {
                    // The previous equality needs to be reevaluated.
                    equalities.pop();
                    pointer = equalities.last().map(|&idx| idx + 1).unwrap_or(0);
                    post_ins = false;
                    post_del = false;
                }
                changes = true;
            } else {
                pointer += 1;
            }
        }
    }
    if changes {
        cleanup_merge(diffs);
    }
}
