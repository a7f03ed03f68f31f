//! Output comparison
//!
//! Captured output is judged by byte-exact equality with the golden file. No
//! trimming, no newline normalisation: a trailing space is a failure.
//!
//! On a mismatch the comparator explains the difference either through a
//! [`DiffRenderer`] or, in raw mode, by dumping both texts in full.

mod diff;

pub use diff::{DiffRenderer, InlineDiff, UnifiedDiff};

/// How a mismatch is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Diff,
    Raw,
}

/// Result of comparing one fixture's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub passed: bool,
    /// Diff or raw dump; `None` when the outputs match.
    pub detail: Option<String>,
}

pub struct OutputComparator {
    mode: DisplayMode,
    renderer: Box<dyn DiffRenderer>,
}

impl Default for OutputComparator {
    fn default() -> Self {
        Self::new(DisplayMode::Diff, Box::new(InlineDiff::default()))
    }
}

impl OutputComparator {
    pub fn new(mode: DisplayMode, renderer: Box<dyn DiffRenderer>) -> Self {
        Self { mode, renderer }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Exact byte equality.
    pub fn matches(expected: &[u8], actual: &[u8]) -> bool {
        expected == actual
    }

    pub fn compare(&self, expected: &[u8], actual: &[u8]) -> Comparison {
        if Self::matches(expected, actual) {
            return Comparison {
                passed: true,
                detail: None,
            };
        }

        let expected = String::from_utf8_lossy(expected);
        let actual = String::from_utf8_lossy(actual);
        let detail = match self.mode {
            DisplayMode::Diff => self.renderer.render(&expected, &actual),
            DisplayMode::Raw => format!("EXPECTED\n{}\nACTUAL\n{}", expected, actual),
        };

        Comparison {
            passed: false,
            detail: Some(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Arrow;

    impl DiffRenderer for Arrow {
        fn render(&self, expected: &str, actual: &str) -> String {
            format!("{}->{}", actual.trim(), expected.trim())
        }
    }

    #[test]
    fn test_equal_passes_without_detail() {
        let cmp = OutputComparator::default();
        assert_eq!(
            cmp.compare(b"5\n", b"5\n"),
            Comparison {
                passed: true,
                detail: None
            }
        );
    }

    #[test]
    fn test_trailing_newline_matters() {
        let cmp = OutputComparator::default();
        assert!(!cmp.compare(b"5\n", b"5").passed);
        assert!(!cmp.compare(b"5", b"5 ").passed);
        assert!(!cmp.compare(b"a\r\n", b"a\n").passed);
    }

    #[test]
    fn test_diff_mode_uses_renderer() {
        let cmp = OutputComparator::new(DisplayMode::Diff, Box::new(Arrow));
        let result = cmp.compare(b"4\n", b"3\n");
        assert!(!result.passed);
        assert_eq!(result.detail.as_deref(), Some("3->4"));
    }

    #[test]
    fn test_raw_mode_dumps_both() {
        let cmp = OutputComparator::new(DisplayMode::Raw, Box::new(Arrow));
        let result = cmp.compare(b"4", b"3");
        assert_eq!(result.detail.as_deref(), Some("EXPECTED\n4\nACTUAL\n3"));
    }

    #[test]
    fn test_invalid_utf8_still_compared_bytewise() {
        let cmp = OutputComparator::default();
        assert!(cmp.compare(&[0xff, 0x00], &[0xff, 0x00]).passed);
        assert!(!cmp.compare(&[0xff], &[0xfe]).passed);
    }
}
