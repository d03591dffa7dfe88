// SPDX-License-Identifier: MIT

///! Approximate substring search using the bitap algorithm. The match state
///! for every error level is a single machine word with one bit per pattern
///! position, which caps the pattern length at [`MAX_BITS`] characters;
///! longer patterns report "no match" rather than an error.
///!
///! Candidate positions are scored by a blend of error count and distance
///! from the expected location, and only positions at or below the
///! configured threshold are reported. Among equally scored positions the
///! earliest index wins.

use std::collections::HashMap;

use crate::diff::common::{find_from, rfind_upto};

/// Width of the bit vectors; patterns longer than this cannot be searched.
pub const MAX_BITS: usize = 32;

#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// How sloppy a match may be: 0.0 demands perfection, 1.0 accepts almost
    /// anything.
    pub threshold: f64,

    /// Weight of the distance penalty. A match `d` characters from the
    /// expected location adds `d / (distance * pattern length)` to its score;
    /// 0.0 restricts matches to the expected location only.
    pub distance: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            distance: 1000.0,
        }
    }
}

/// Locate `pattern` in `text` near the expected location `loc`.
pub fn match_main(text: &str, pattern: &str, loc: usize, config: &MatchConfig) -> Option<usize> {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    match_chars(&text, &pattern, loc, config)
}

pub(crate) fn match_chars(
    text: &[char],
    pattern: &[char],
    loc: usize,
    config: &MatchConfig,
) -> Option<usize> {
    let loc = loc.min(text.len());
    if text == pattern {
        // Shortcut, which also covers two empty inputs.
        return Some(0);
    }
    if text.is_empty() {
        return None;
    }
    if pattern.is_empty() {
        return Some(loc);
    }
    if loc + pattern.len() <= text.len() && text[loc..loc + pattern.len()] == *pattern {
        // Perfect match at the expected location.
        return Some(loc);
    }
    if pattern.len() > MAX_BITS {
        return None;
    }
    bitap(text, pattern, loc, config)
}

/// Score a hit with `errors` edits found at position `pos`; 0.0 is a perfect
/// match at the expected location, scores above the threshold are rejected.
fn bitap_score(errors: usize, pos: usize, loc: usize, pattern_len: usize, config: &MatchConfig) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = loc.abs_diff(pos) as f64;
    if config.distance == 0.0 {
        if proximity == 0.0 {
            return accuracy;
        }
        return 1.0;
    }
    accuracy + proximity / (config.distance * pattern_len as f64)
}

/// One bit per pattern position, for every character of the pattern.
fn alphabet(pattern: &[char]) -> HashMap<char, u64> {
    let mut map: HashMap<char, u64> = HashMap::new();
    for (i, &c) in pattern.iter().enumerate() {
        *map.entry(c).or_insert(0) |= 1u64 << (pattern.len() - i - 1);
    }
    map
}

fn bitap(text: &[char], pattern: &[char], loc: usize, config: &MatchConfig) -> Option<usize> {
    assert!(pattern.len() <= MAX_BITS);

    let alphabet = alphabet(pattern);
    let pattern_len = pattern.len();

    // Prime the threshold with any exact occurrences near the expected
    // location, in both directions.
    let mut score_threshold = config.threshold;
    if let Some(found) = find_from(text, pattern, loc) {
        score_threshold = bitap_score(0, found, loc, pattern_len, config).min(score_threshold);
        if let Some(found) = rfind_upto(text, pattern, loc + pattern_len) {
            score_threshold = bitap_score(0, found, loc, pattern_len, config).min(score_threshold);
        }
    }

    let matchmask = 1u64 << (pattern_len - 1);
    let mut best_loc: Option<usize> = None;

    let mut bin_max = pattern_len + text.len();
    let mut last_rd: Vec<u64> = Vec::new();
    for d in 0..pattern_len {
        // Binary search for the widest window around `loc` that could still
        // beat the score threshold at this error level.
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if bitap_score(d, loc + bin_mid, loc, pattern_len, config) <= score_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        // Use the result as the top of the window for the next level too.
        bin_max = bin_mid;
        let mut start = 1.max(loc as isize - bin_mid as isize + 1) as usize;
        let finish = (loc + bin_mid).min(text.len()) + pattern_len;

        let mut rd = vec![0u64; finish + 2];
        rd[finish + 1] = (1u64 << d) - 1;
        let mut j = finish;
        while j >= start {
            let char_match = if text.len() < j {
                // Out of range.
                0
            } else {
                alphabet.get(&text[j - 1]).copied().unwrap_or(0)
            };
            rd[j] = if d == 0 {
                // First pass: exact matches only.
                ((rd[j + 1] << 1) | 1) & char_match
            } else {
                // Subsequent passes: fuzzy matches with substitutions,
                // insertions and deletions folded in.
                (((rd[j + 1] << 1) | 1) & char_match)
                    | (((last_rd[j + 1] | last_rd[j]) << 1) | 1)
                    | last_rd[j + 1]
            };
            if rd[j] & matchmask != 0 {
                let score = bitap_score(d, j - 1, loc, pattern_len, config);
                if score <= score_threshold {
                    score_threshold = score;
                    best_loc = Some(j - 1);
                    if j - 1 > loc {
                        // The hit is past the expected location; the window
                        // before it can still hold something closer.
                        start = 1.max(2 * loc as isize - (j - 1) as isize) as usize;
                    } else {
                        // Everything earlier is further away.
                        break;
                    }
                }
            }
            j -= 1;
        }
        if bitap_score(d + 1, loc, loc, pattern_len, config) > score_threshold {
            // No hope of a better match with more errors.
            break;
        }
        last_rd = rd;
    }

    best_loc
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_alphabet() {
        let map = alphabet(&['a', 'b', 'c']);
        assert_eq!(map[&'a'], 4);
        assert_eq!(map[&'b'], 2);
        assert_eq!(map[&'c'], 1);

        // Duplicates accumulate.
        let map = alphabet(&['a', 'b', 'c', 'a', 'b', 'a']);
        assert_eq!(map[&'a'], 37);
        assert_eq!(map[&'b'], 18);
        assert_eq!(map[&'c'], 8);
    }

    #[test]
    fn test_shortcuts() {
        let config = MatchConfig::default();
        assert_eq!(match_main("abcdef", "abcdef", 1000, &config), Some(0));
        assert_eq!(match_main("", "abcdef", 1, &config), None);
        assert_eq!(match_main("abcdef", "", 3, &config), Some(3));
        assert_eq!(match_main("abcdef", "de", 3, &config), Some(3));
        assert_eq!(match_main("abcdef", "defy", 4, &config), Some(3));
        assert_eq!(match_main("abcdef", "abcdefy", 0, &config), Some(0));
    }

    #[test]
    fn test_oversized_pattern() {
        let config = MatchConfig::default();
        let pattern = "a".repeat(MAX_BITS + 1);
        let text = format!("xx{}xx", pattern);
        assert_eq!(match_main(&text, &pattern, 0, &config), None);
    }
}
