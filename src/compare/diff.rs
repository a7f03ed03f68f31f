//! Diff rendering strategies
//!
//! The comparator only needs `render(expected, actual) -> text`; how the two
//! strings get aligned is up to the renderer.

use similar::{ChangeTag, TextDiff};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Turns two texts into a human-readable alignment.
pub trait DiffRenderer {
    fn render(&self, expected: &str, actual: &str) -> String;
}

/// Character-level inline diff.
///
/// Text only in `expected` is a deletion, text only in `actual` an insertion.
/// With color, deletions are red and insertions green. Without color they are
/// wrapped as `[-deleted-]` and `{+inserted+}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDiff {
    pub color: bool,
}

impl InlineDiff {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn push_run(&self, out: &mut String, tag: ChangeTag, text: &str) {
        match (tag, self.color) {
            (ChangeTag::Equal, _) => out.push_str(text),
            (ChangeTag::Delete, true) => {
                out.push_str(RED);
                out.push_str(text);
                out.push_str(RESET);
            }
            (ChangeTag::Insert, true) => {
                out.push_str(GREEN);
                out.push_str(text);
                out.push_str(RESET);
            }
            (ChangeTag::Delete, false) => {
                out.push_str("[-");
                out.push_str(text);
                out.push_str("-]");
            }
            (ChangeTag::Insert, false) => {
                out.push_str("{+");
                out.push_str(text);
                out.push_str("+}");
            }
        }
    }
}

impl DiffRenderer for InlineDiff {
    fn render(&self, expected: &str, actual: &str) -> String {
        let diff = TextDiff::from_chars(expected, actual);
        let mut out = String::new();
        let mut run = String::new();
        let mut run_tag = ChangeTag::Equal;

        // Coalesce consecutive changes with the same tag into one run.
        for change in diff.iter_all_changes() {
            if change.tag() != run_tag && !run.is_empty() {
                self.push_run(&mut out, run_tag, &run);
                run.clear();
            }
            run_tag = change.tag();
            run.push_str(change.value());
        }
        if !run.is_empty() {
            self.push_run(&mut out, run_tag, &run);
        }

        out
    }
}

/// Line-oriented unified diff, for outputs where inline markers get noisy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnifiedDiff;

impl DiffRenderer for UnifiedDiff {
    fn render(&self, expected: &str, actual: &str) -> String {
        TextDiff::from_lines(expected, actual)
            .unified_diff()
            .header("expected", "actual")
            .to_string()
    }
}
