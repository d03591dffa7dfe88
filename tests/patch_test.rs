// SPDX-License-Identifier: MIT

use fuzzy_patch::bitap::MAX_BITS;
use fuzzy_patch::diff::{Difference, EditType};
use fuzzy_patch::patch::*;

fn eq(text: &str) -> Difference {
    Difference::new(EditType::Equal, text)
}
fn ins(text: &str) -> Difference {
    Difference::new(EditType::Insert, text)
}
fn del(text: &str) -> Difference {
    Difference::new(EditType::Delete, text)
}

const FOX1: &str = "The quick brown fox jumps over the lazy dog.";
const FOX2: &str = "That quick brown fox jumped over a lazy dog.";

#[test]
fn patch_display() {
    let patch = Patch {
        diffs: vec![
            eq("jump"),
            del("s"),
            ins("ed"),
            eq(" over "),
            del("the"),
            ins("a"),
            eq(" laz"),
        ],
        start1: 20,
        length1: 18,
        start2: 21,
        length2: 17,
    };
    assert_eq!(
        patch.to_string(),
        "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n"
    );
}

#[test]
fn patch_from_text_roundtrip() -> fuzzy_patch::utils::Result<()> {
    assert_eq!(patch_from_text("")?, vec![]);

    for text in [
        "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n",
        "@@ -1 +1 @@\n-a\n+b\n",
        "@@ -1,3 +0,0 @@\n-abc\n",
        "@@ -0,0 +1,3 @@\n+abc\n",
    ] {
        let patches = patch_from_text(text)?;
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].to_string(), text);
    }
    Ok(())
}

#[test]
fn patch_from_text_rejects_garbage() {
    assert!(patch_from_text("Bad\nPatch\n").is_err());
    // Unknown line prefix.
    assert!(patch_from_text("@@ -1 +1 @@\nxabc\n").is_err());
    // Broken percent escape.
    assert!(patch_from_text("@@ -1 +1 @@\n-a\n+%ZZ\n").is_err());
}

#[test]
fn patch_add_context_vectors() -> fuzzy_patch::utils::Result<()> {
    let mut p = patch_from_text("@@ -21,4 +21,10 @@\n-jump\n+somersault\n")?.remove(0);
    patch_add_context(&mut p, FOX1, 4);
    assert_eq!(
        p.to_string(),
        "@@ -17,12 +17,18 @@\n fox \n-jump\n+somersault\n s ov\n"
    );

    let mut p = patch_from_text("@@ -21,4 +21,10 @@\n-jump\n+somersault\n")?.remove(0);
    patch_add_context(&mut p, "The quick brown fox jumps.", 4);
    assert_eq!(
        p.to_string(),
        "@@ -17,10 +17,16 @@\n fox \n-jump\n+somersault\n s.\n"
    );

    let mut p = patch_from_text("@@ -3 +3,2 @@\n-e\n+at\n")?.remove(0);
    patch_add_context(&mut p, "The quick brown fox jumps.", 4);
    assert_eq!(p.to_string(), "@@ -1,7 +1,8 @@\n Th\n-e\n+at\n  qui\n");

    // Ambiguous context has to grow until it is unique.
    let mut p = patch_from_text("@@ -3 +3,2 @@\n-e\n+at\n")?.remove(0);
    patch_add_context(
        &mut p,
        "The quick brown fox jumps.  The quick brown fox crashes.",
        4,
    );
    assert_eq!(
        p.to_string(),
        "@@ -1,27 +1,28 @@\n Th\n-e\n+at\n  quick brown fox jumps. \n"
    );
    Ok(())
}

#[test]
fn patch_make_vectors() {
    let config = PatchConfig::default();

    assert_eq!(patch_to_text(&patch_make("", "", &config)), "");

    let patches = patch_make(FOX1, FOX2, &config);
    assert_eq!(
        patch_to_text(&patches),
        "@@ -1,11 +1,12 @@\n Th\n-e\n+at\n  quick b\n@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n"
    );
}

#[test]
fn patch_text_character_encoding() -> fuzzy_patch::utils::Result<()> {
    let config = PatchConfig::default();
    let patches = patch_make(
        "`1234567890-=[]\\;',./",
        "~!@#$%^&*()_+{}|:\"<>?",
        &config,
    );
    assert_eq!(
        patch_to_text(&patches),
        "@@ -1,21 +1,21 @@\n-%601234567890-=%5B%5D%5C;',./\n+~!@#$%25%5E&*()_+%7B%7D%7C:%22%3C%3E?\n"
    );

    let patches = patch_from_text(
        "@@ -1,21 +1,21 @@\n-%601234567890-=%5B%5D%5C;',./\n+~!@#$%25%5E&*()_+%7B%7D%7C:%22%3C%3E?\n",
    )?;
    assert_eq!(
        patches[0].diffs,
        vec![del("`1234567890-=[]\\;',./"), ins("~!@#$%^&*()_+{}|:\"<>?")]
    );
    Ok(())
}

#[test]
fn patch_split_max_leaves_large_deletions_whole() {
    let config = PatchConfig::default();
    let mut patches = patch_make(
        "abcdef1234567890123456789012345678901234567890123456789012345678901234567890uvwxyz",
        "abcdefuvwxyz",
        &config,
    );
    let before = patch_to_text(&patches);
    patch_split_max(&mut patches, &config);
    assert_eq!(patch_to_text(&patches), before);
}

#[test]
fn patch_split_max_splits_scattered_edits() {
    let config = PatchConfig::default();
    let a = "abcdefghijklmnopqrstuvwxyz01234567890";
    let b = "XabXcdXefXghXijXklXmnXopXqrXstXuvXwxXyzX01X23X45X67X89X0";
    let mut patches = patch_make(a, b, &config);
    assert_eq!(patches.len(), 1);

    patch_split_max(&mut patches, &config);
    assert!(patches.len() > 1);
    for patch in &patches {
        assert!(patch.length1 <= MAX_BITS);
    }

    // Splitting must not lose anything: the pieces still apply cleanly.
    let (result, applied) = patch_apply(&patches, a, &config);
    assert_eq!(result, b);
    assert!(applied.iter().all(|&ok| ok));
}

#[test]
fn patch_add_padding_vectors() {
    let config = PatchConfig::default();

    // Both edges need padding.
    let mut patches = patch_make("", "test", &config);
    assert_eq!(patch_to_text(&patches), "@@ -0,0 +1,4 @@\n+test\n");
    patch_add_padding(&mut patches, &config);
    assert_eq!(
        patch_to_text(&patches),
        "@@ -1,8 +1,12 @@\n %01%02%03%04\n+test\n %01%02%03%04\n"
    );

    // Both edges have partial padding.
    let mut patches = patch_make("XY", "XtestY", &config);
    assert_eq!(patch_to_text(&patches), "@@ -1,2 +1,6 @@\n X\n+test\n Y\n");
    patch_add_padding(&mut patches, &config);
    assert_eq!(
        patch_to_text(&patches),
        "@@ -2,8 +2,12 @@\n %02%03%04X\n+test\n Y%01%02%03\n"
    );

    // Both edges are already full.
    let mut patches = patch_make("XXXXYYYY", "XXXXtestYYYY", &config);
    assert_eq!(
        patch_to_text(&patches),
        "@@ -1,8 +1,12 @@\n XXXX\n+test\n YYYY\n"
    );
    patch_add_padding(&mut patches, &config);
    assert_eq!(
        patch_to_text(&patches),
        "@@ -5,8 +5,12 @@\n XXXX\n+test\n YYYY\n"
    );
}

#[test]
fn patch_apply_vectors() {
    let config = PatchConfig::default();
    let patches = patch_make(FOX1, FOX2, &config);

    // Exact application.
    let (result, applied) = patch_apply(&patches, FOX1, &config);
    assert_eq!(result, FOX2);
    assert_eq!(applied, vec![true, true]);

    // The base has drifted, but the context still matches fuzzily.
    let (result, applied) = patch_apply(
        &patches,
        "The quick red rabbit jumps over the tired tiger.",
        &config,
    );
    assert_eq!(result, "That quick red rabbit jumped over a tired tiger.");
    assert_eq!(applied, vec![true, true]);

    // A completely unrelated base leaves the text untouched.
    let (result, applied) = patch_apply(
        &patches,
        "I am the very model of a modern major general.",
        &config,
    );
    assert_eq!(result, "I am the very model of a modern major general.");
    assert_eq!(applied, vec![false, false]);
}

#[test]
fn patch_apply_at_the_edges() {
    let config = PatchConfig::default();

    let patches = patch_make("", "test", &config);
    assert_eq!(patch_apply(&patches, "", &config), ("test".to_string(), vec![true]));

    let patches = patch_make("XY", "XtestY", &config);
    assert_eq!(
        patch_apply(&patches, "XY", &config),
        ("XtestY".to_string(), vec![true])
    );

    // Near the edge with a drifted base.
    let patches = patch_make("y", "y123", &config);
    assert_eq!(
        patch_apply(&patches, "x", &config),
        ("x123".to_string(), vec![true])
    );
}

#[test]
fn patch_apply_roundtrips() {
    let config = PatchConfig::default();
    let cases = [
        (FOX1, FOX2),
        ("", "entirely new content"),
        ("entirely old content", ""),
        ("Ünïcødé tëxt ❤ here", "Unicode tëxt ❤❤ there"),
        (
            "abcdef1234567890123456789012345678901234567890123456789012345678901234567890uvwxyz",
            "abcdefuvwxyz",
        ),
    ];
    for (a, b) in cases {
        let patches = patch_make(a, b, &config);
        let (result, applied) = patch_apply(&patches, a, &config);
        assert_eq!(result, b, "{:?}", (a, b));
        assert!(applied.iter().all(|&ok| ok), "{:?}", (a, b));
    }
}

#[test]
fn patch_apply_has_no_side_effects() {
    let config = PatchConfig::default();
    let patches = patch_make(FOX1, FOX2, &config);
    let before = patch_to_text(&patches);
    let _ = patch_apply(&patches, FOX1, &config);
    assert_eq!(patch_to_text(&patches), before);
}

#[test]
fn patch_make_then_text_roundtrip() -> fuzzy_patch::utils::Result<()> {
    let config = PatchConfig::default();
    let patches = patch_make(FOX1, FOX2, &config);
    assert_eq!(patch_from_text(&patch_to_text(&patches))?, patches);
    Ok(())
}
