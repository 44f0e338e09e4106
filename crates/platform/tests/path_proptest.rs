//! Property tests for volume path handling.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use platform::storage::{join_path, normalize_path, parent_path};

proptest::proptest! {
    #[test]
    fn normalized_paths_never_escape(path in "[a-z./]{0,24}") {
        if let Ok(rel) = normalize_path(&path) {
            proptest::prop_assert!(!rel.split('/').any(|part| part == ".."));
            proptest::prop_assert!(!rel.starts_with('/'));
            proptest::prop_assert!(!rel.ends_with('/'));
        }
    }

    #[test]
    fn normalize_is_idempotent(path in "[a-z/]{0,24}") {
        let once = normalize_path(&path).unwrap();
        proptest::prop_assert_eq!(normalize_path(once).unwrap(), once);
    }

    #[test]
    fn parent_of_join_is_dir(dir in "[a-z]{1,8}(/[a-z]{1,8}){0,3}", name in "[a-z]{1,8}\\.[a-z]{3}") {
        let joined = join_path(&dir, &name);
        proptest::prop_assert_eq!(parent_path(&joined), dir.as_str());
    }
}

#[test]
fn join_at_root_has_no_separator() {
    assert_eq!(join_path("", "a.wav"), "a.wav");
    assert_eq!(parent_path("a.wav"), "");
}
