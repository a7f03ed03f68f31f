//! Property-based tests for fixture pairing and comparison
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs.

use std::path::{Path, PathBuf};

use autograder::{OutputComparator, expected_path};
use proptest::prelude::*;

fn stem() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,16}"
}

proptest! {
    /// The golden file keeps the directory and stem, and only swaps the extension.
    #[test]
    fn expected_path_keeps_stem(dir in stem(), name in stem(), ext in "(py|stdin)") {
        let fixture = PathBuf::from(&dir).join(format!("{name}.{ext}"));
        let expected = expected_path(&fixture);
        prop_assert_eq!(expected.parent(), Some(Path::new(&dir)));
        prop_assert_eq!(expected.file_stem().and_then(|s| s.to_str()), Some(name.as_str()));
        prop_assert_eq!(expected.extension().and_then(|e| e.to_str()), Some("out"));
    }

    /// Pairing is idempotent on its own output.
    #[test]
    fn expected_path_is_idempotent(name in stem()) {
        let once = expected_path(Path::new(&format!("{name}.stdin")));
        prop_assert_eq!(expected_path(&once), once);
    }

    /// Distinct stems in one directory never share a golden file.
    #[test]
    fn expected_path_is_collision_free(a in stem(), b in stem()) {
        prop_assume!(a != b);
        let pa = expected_path(Path::new(&format!("cases/test-{a}.py")));
        let pb = expected_path(Path::new(&format!("cases/test-{b}.py")));
        prop_assert_ne!(pa, pb);
    }

    /// Any single appended byte makes the comparison fail.
    #[test]
    fn comparison_is_exact(text in ".{0,64}", extra in any::<u8>()) {
        let cmp = OutputComparator::default();
        let expected = text.as_bytes().to_vec();
        let mut actual = expected.clone();
        actual.push(extra);
        prop_assert!(cmp.compare(&expected, &expected).passed);
        prop_assert!(!cmp.compare(&expected, &actual).passed);
    }
}
