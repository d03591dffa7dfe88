// SPDX-License-Identifier: MIT

///! Commonality queries between two sequences: shared prefix and suffix runs,
///! overlap between the tail of one input and the head of the other, and the
///! "half match" heuristic that looks for a single large substring present in
///! both inputs.
///!
///! The workers operate on token slices so that both character-level and
///! line-encoded diffs share them; the `&str` entry points are the public
///! surface and count in characters.

/// Number of leading tokens shared by `a` and `b`.
pub(crate) fn prefix_len<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Number of trailing tokens shared by `a` and `b`.
pub(crate) fn suffix_len<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// First occurrence of `needle` in `haystack` at or after `from`.
pub(crate) fn find_from<T: Eq>(haystack: &[T], needle: &[T], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= haystack.len()).then_some(from);
    }
    if from + needle.len() > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

/// Last occurrence of `needle` in `haystack` starting at or before `upto`.
pub(crate) fn rfind_upto<T: Eq>(haystack: &[T], needle: &[T], upto: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(upto.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let last = upto.min(haystack.len() - needle.len());
    (0..=last)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
///
/// Misses skip the search forward by the whole miss distance, so the loop is
/// linear in practice despite the re-comparisons.
pub(crate) fn overlap_len<T: Eq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let limit = a.len().min(b.len());
    let a = &a[a.len() - limit..];
    let b = &b[..limit];
    if a == b {
        return limit;
    }

    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &a[limit - length..];
        let Some(found) = find_from(b, pattern, 0) else {
            return best;
        };
        length += found;
        if found == 0 || a[limit - length..] == b[..length] {
            best = length;
            length += 1;
        }
    }
}

/// A successful half match: `common` occurs in both inputs and spans at least
/// half of the longer one. The remaining fields are the fragments surrounding
/// it, `1` referring to the first input and `2` to the second.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HalfMatchRef<'a, T> {
    pub prefix1: &'a [T],
    pub suffix1: &'a [T],
    pub prefix2: &'a [T],
    pub suffix2: &'a [T],
    pub common: &'a [T],
}

pub(crate) fn half_match_slices<'a, T: Copy + Eq>(
    a: &'a [T],
    b: &'a [T],
) -> Option<HalfMatchRef<'a, T>> {
    let a_is_long = a.len() > b.len();
    let (long, short) = if a_is_long { (a, b) } else { (b, a) };
    if short.len() < 4 || short.len() * 2 < long.len() {
        return None;
    }

    // Seeds from the second and third quarters of the longer side.
    let hm1 = half_match_at(long, short, (long.len() + 3) / 4);
    let hm2 = half_match_at(long, short, (long.len() + 1) / 2);
    let hm = match (hm1, hm2) {
        (None, None) => return None,
        (Some(hm), None) | (None, Some(hm)) => hm,
        (Some(hm1), Some(hm2)) => {
            if hm1.common.len() > hm2.common.len() {
                hm1
            } else {
                hm2
            }
        }
    };

    Some(if a_is_long {
        hm
    } else {
        HalfMatchRef {
            prefix1: hm.prefix2,
            suffix1: hm.suffix2,
            prefix2: hm.prefix1,
            suffix2: hm.suffix1,
            common: hm.common,
        }
    })
}

/// Probe for a half match around position `i` of `long`, sliding a quarter-size
/// seed over every occurrence in `short` and extending each hit in both
/// directions.
fn half_match_at<'a, T: Copy + Eq>(
    long: &'a [T],
    short: &'a [T],
    i: usize,
) -> Option<HalfMatchRef<'a, T>> {
    let seed = &long[i..i + long.len() / 4];
    let mut best: Option<HalfMatchRef<'a, T>> = None;

    let mut j = find_from(short, seed, 0);
    while let Some(found) = j {
        let prefix_length = prefix_len(&long[i..], &short[found..]);
        let suffix_length = suffix_len(&long[..i], &short[..found]);
        let best_len = best.map(|hm| hm.common.len()).unwrap_or(0);
        if best_len < suffix_length + prefix_length {
            best = Some(HalfMatchRef {
                prefix1: &long[..i - suffix_length],
                suffix1: &long[i + prefix_length..],
                prefix2: &short[..found - suffix_length],
                suffix2: &short[found + prefix_length..],
                common: &short[found - suffix_length..found + prefix_length],
            });
        }
        j = find_from(short, seed, found + 1);
    }

    best.filter(|hm| hm.common.len() * 2 >= long.len())
}

/// Number of leading characters shared by `a` and `b`.
pub fn common_prefix(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Number of trailing characters shared by `a` and `b`.
pub fn common_suffix(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Number of characters in the longest suffix of `a` that is a prefix of `b`.
pub fn common_overlap(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    overlap_len(&a, &b)
}

/// Owned form of a half match, for callers working with `&str` inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfMatch {
    pub prefix1: String,
    pub suffix1: String,
    pub prefix2: String,
    pub suffix2: String,
    pub common: String,
}

/// Look for a substring shared by `a` and `b` that is at least half as long as
/// the longer input. Returns the surrounding fragments along with the common
/// middle, or `None` when no qualifying match exists or the shorter input has
/// fewer than four characters.
pub fn half_match(a: &str, b: &str) -> Option<HalfMatch> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    half_match_slices(&a, &b).map(|hm| HalfMatch {
        prefix1: hm.prefix1.iter().collect(),
        suffix1: hm.suffix1.iter().collect(),
        prefix2: hm.prefix2.iter().collect(),
        suffix2: hm.suffix2.iter().collect(),
        common: hm.common.iter().collect(),
    })
}
