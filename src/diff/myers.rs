// SPDX-License-Identifier: MIT

///! Core shortest-edit-script search over token slices.
///!
///! The classic formulation is a recursive divide and conquer: find the middle
///! snake, then diff the two halves. Here the recursion is flattened into an
///! explicit work stack so that arbitrarily large inputs cannot exhaust the
///! call stack. Stack entries are either a region still to be diffed or a run
///! that is ready to be emitted; pushing the pieces of a split in reverse
///! order keeps the output in source order.

use std::time::Instant;

use super::common;
use super::EditType;

/// One maximal run of the edit script: the operation and the tokens it covers.
pub(crate) type Run = (EditType, Vec<u32>);

/// Sides below this many tokens are never worth line-mode encoding.
const LINE_MODE_MIN: usize = 100;

enum Work<'a> {
    Region {
        a: &'a [u32],
        b: &'a [u32],
        check_lines: bool,
    },
    Emit(EditType, &'a [u32]),
}

/// Diff two token sequences within an optional wall-clock deadline.
///
/// When the deadline expires, regions still on the stack degrade to a plain
/// delete-plus-insert instead of failing. A delete is always emitted before
/// an insert at the same position.
pub(crate) fn diff_tokens(
    a: &[u32],
    b: &[u32],
    check_lines: bool,
    deadline: Option<Instant>,
) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::new();
    let mut stack = vec![Work::Region { a, b, check_lines }];

    while let Some(item) = stack.pop() {
        let (a, b, check_lines) = match item {
            Work::Emit(edit, run) => {
                out.push((edit, run.to_vec()));
                continue;
            }
            Work::Region { a, b, check_lines } => (a, b, check_lines),
        };

        #[cfg(feature = "debug-diff")]
        println!("region old: {} new: {}", a.len(), b.len());

        // Peel off the common prefix and suffix; the prefix precedes whatever
        // the region produces and can go out immediately, the suffix has to
        // wait for the region's own runs.
        let prefix = common::prefix_len(a, b);
        if prefix != 0 {
            out.push((EditType::Equal, a[..prefix].to_vec()));
        }
        let suffix = common::suffix_len(&a[prefix..], &b[prefix..]);
        if suffix != 0 {
            stack.push(Work::Emit(EditType::Equal, &a[a.len() - suffix..]));
        }
        let a = &a[prefix..a.len() - suffix];
        let b = &b[prefix..b.len() - suffix];

        if a.is_empty() && b.is_empty() {
            continue;
        }
        if a.is_empty() {
            out.push((EditType::Insert, b.to_vec()));
            continue;
        }
        if b.is_empty() {
            out.push((EditType::Delete, a.to_vec()));
            continue;
        }

        let (long, short) = if a.len() > b.len() { (a, b) } else { (b, a) };
        if let Some(i) = common::find_from(long, short, 0) {
            // The shorter side is entirely contained in the longer one.
            let edit = if a.len() > b.len() {
                EditType::Delete
            } else {
                EditType::Insert
            };
            if i != 0 {
                out.push((edit, long[..i].to_vec()));
            }
            out.push((EditType::Equal, short.to_vec()));
            if i + short.len() != long.len() {
                out.push((edit, long[i + short.len()..].to_vec()));
            }
            continue;
        }
        if short.len() == 1 {
            // Single token on one side with no containment: no equality is
            // possible.
            out.push((EditType::Delete, a.to_vec()));
            out.push((EditType::Insert, b.to_vec()));
            continue;
        }

        // The half-match shortcut trades optimality for speed, so it only
        // runs when a deadline bounds the search.
        if deadline.is_some() {
            if let Some(hm) = common::half_match_slices(a, b) {
                stack.push(Work::Region {
                    a: hm.suffix1,
                    b: hm.suffix2,
                    check_lines,
                });
                stack.push(Work::Emit(EditType::Equal, hm.common));
                stack.push(Work::Region {
                    a: hm.prefix1,
                    b: hm.prefix2,
                    check_lines,
                });
                continue;
            }
        }

        if check_lines && a.len() > LINE_MODE_MIN && b.len() > LINE_MODE_MIN {
            out.extend(super::line_mode_runs(a, b, deadline));
            continue;
        }

        match bisect(a, b, deadline) {
            Some((x, y)) => {
                stack.push(Work::Region {
                    a: &a[x..],
                    b: &b[y..],
                    check_lines: false,
                });
                stack.push(Work::Region {
                    a: &a[..x],
                    b: &b[..y],
                    check_lines: false,
                });
            }
            None => {
                // Timed out, or no commonality at all.
                out.push((EditType::Delete, a.to_vec()));
                out.push((EditType::Insert, b.to_vec()));
            }
        }
    }

    out
}

/// Find a point where the forward and reverse edit paths of the O(ND) search
/// cross, splitting the problem in two. Returns `None` when the deadline cuts
/// the search short or the inputs share nothing.
fn bisect(a: &[u32], b: &[u32], deadline: Option<Instant>) -> Option<(usize, usize)> {
    let a_len = a.len() as i32;
    let b_len = b.len() as i32;
    let max_d = (a_len + b_len + 1) / 2;
    let v_offset = max_d;
    let v_length = 2 * max_d;
    let mut v1 = vec![-1i32; v_length as usize];
    let mut v2 = vec![-1i32; v_length as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;
    let delta = a_len - b_len;
    // If the total number of tokens is odd, the front path will collide with
    // the reverse path; otherwise the reverse path detects the overlap.
    let front = delta % 2 != 0;
    // Trim ranges of k where the path has run off an edge of the grid.
    let mut k1start = 0i32;
    let mut k1end = 0i32;
    let mut k2start = 0i32;
    let mut k2end = 0i32;

    for d in 0..max_d {
        if let Some(deadline) = deadline {
            if Instant::now() > deadline {
                break;
            }
        }

        // Walk the front path one step.
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < a_len && y1 < b_len && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > a_len {
                // Ran off the right of the grid.
                k1end += 2;
            } else if y1 > b_len {
                // Ran off the bottom of the grid.
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                    // Mirror x2 onto the top-left coordinate system.
                    let x2 = a_len - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k1 += 2;
        }

        // Walk the reverse path one step.
        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < a_len
                && y2 < b_len
                && a[(a_len - x2 - 1) as usize] == b[(b_len - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > a_len {
                k2end += 2;
            } else if y2 > b_len {
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    let x2 = a_len - x2;
                    if x1 >= x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k2 += 2;
        }
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    fn text(run: &[u32]) -> String {
        run.iter().map(|&t| char::from_u32(t).unwrap()).collect()
    }

    #[test]
    fn test_bisect_split() {
        let a = tokens("cat");
        let b = tokens("map");
        let runs = diff_tokens(&a, &b, false, None);
        let rendered: Vec<(EditType, String)> =
            runs.iter().map(|(edit, run)| (*edit, text(run))).collect();
        assert_eq!(
            rendered,
            vec![
                (EditType::Delete, "c".into()),
                (EditType::Insert, "m".into()),
                (EditType::Equal, "a".into()),
                (EditType::Delete, "t".into()),
                (EditType::Insert, "p".into()),
            ]
        );
    }

    #[test]
    fn test_expired_deadline_degrades() {
        let a = tokens("cat");
        let b = tokens("map");
        let past = Instant::now() - std::time::Duration::from_secs(1);
        let runs = diff_tokens(&a, &b, false, Some(past));
        let rendered: Vec<(EditType, String)> =
            runs.iter().map(|(edit, run)| (*edit, text(run))).collect();
        assert_eq!(
            rendered,
            vec![
                (EditType::Delete, "cat".into()),
                (EditType::Insert, "map".into()),
            ]
        );
    }
}
