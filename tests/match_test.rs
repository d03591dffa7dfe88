// SPDX-License-Identifier: MIT

use fuzzy_patch::bitap::*;

fn config(threshold: f64, distance: f64) -> MatchConfig {
    MatchConfig {
        threshold,
        distance,
    }
}

#[test]
fn match_shortcuts() {
    let config = MatchConfig::default();
    assert_eq!(match_main("abcdef", "abcdef", 1000, &config), Some(0));
    assert_eq!(match_main("", "abcdef", 1, &config), None);
    assert_eq!(match_main("abcdef", "", 3, &config), Some(3));
    assert_eq!(match_main("abcdef", "de", 3, &config), Some(3));
}

#[test]
fn match_fuzzy() {
    let config = config(0.5, 100.0);
    assert_eq!(match_main("abcdefghijk", "fgh", 5, &config), Some(5));
    assert_eq!(match_main("abcdefghijk", "fgh", 0, &config), Some(5));
    assert_eq!(match_main("abcdefghijk", "efxhi", 0, &config), Some(2));
    assert_eq!(match_main("abcdefghijk", "cdefxyhijk", 5, &config), Some(2));
    assert_eq!(match_main("abcdefghijk", "bxy", 1, &config), None);
    assert_eq!(match_main("123456789xx0", "3456789x0", 2, &config), Some(2));
    assert_eq!(match_main("abcdef", "defy", 4, &config), Some(3));
    assert_eq!(match_main("abcdef", "abcdefy", 0, &config), Some(0));
}

#[test]
fn match_threshold() {
    assert_eq!(
        match_main("abcdefghijk", "efxyhi", 1, &config(0.4, 100.0)),
        Some(4)
    );
    assert_eq!(
        match_main("abcdefghijk", "efxyhi", 1, &config(0.3, 100.0)),
        None
    );
    assert_eq!(
        match_main("abcdefghijk", "bcdef", 1, &config(0.0, 100.0)),
        Some(1)
    );
    // The example everyone quotes: a sloppy threshold finds a sloppy match.
    assert_eq!(
        match_main(
            "I am the very model of a modern major general.",
            " that berry ",
            5,
            &config(0.7, 1000.0)
        ),
        Some(4)
    );
}

#[test]
fn match_distance_weight() {
    // A tight distance weight rejects matches far from the expected location.
    assert_eq!(
        match_main("abcdefghijklmnopqrstuvwxyz", "abcdefg", 24, &config(0.5, 1.0)),
        None
    );
    // A loose one finds them.
    assert_eq!(
        match_main(
            "abcdefghijklmnopqrstuvwxyz",
            "abcdefg",
            24,
            &config(0.5, 1000.0)
        ),
        Some(0)
    );
    // Zero weight restricts the search to the expected location.
    assert_eq!(
        match_main("abcdefghijklmnopqrstuvwxyz", "abcdefg", 3, &config(0.1, 0.0)),
        None
    );
    assert_eq!(
        match_main("abcdefghijklmnopqrstuvwxyz", "abcdefg", 0, &config(0.5, 0.0)),
        Some(0)
    );
}

#[test]
fn match_oversized_pattern() {
    let config = MatchConfig::default();
    let pattern = "0123456789".repeat(4);
    let text = format!("xxx{}xxx", pattern);
    assert_eq!(match_main(&text, &pattern, 0, &config), None);
}
