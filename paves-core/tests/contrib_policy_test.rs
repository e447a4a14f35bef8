//! Contributor PDFs must never be packaged

use std::fs;
use std::path::Path;

#[test]
fn test_contrib_dir_excluded_from_package() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
    let contents = fs::read_to_string(manifest).unwrap();
    assert!(
        contents.contains(r#"exclude = ["tests/contrib/"]"#),
        "tests/contrib/ must be excluded from the published crate"
    );
}

#[test]
fn test_contrib_pdfs_ignored_by_git() {
    let gitignore = Path::new(env!("CARGO_MANIFEST_DIR")).join("../.gitignore");
    let contents = fs::read_to_string(gitignore).unwrap();
    assert!(contents.lines().any(|l| l.trim() == "paves-core/tests/contrib/*.pdf"));
}
