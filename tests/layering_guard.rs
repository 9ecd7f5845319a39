//! Layering guardrails for the workspace crates.
//!
//! `tern_core` is shared vocabulary and depends on nothing. `tern_syntax` may use `tern_core` but
//! never the session crate (`tern`). These tests scan the member manifests' `[dependencies]`.

fn dependency_names(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn syntax_crate_does_not_depend_on_the_session_crate() {
    let deps = dependency_names(include_str!("../crates/tern_syntax/Cargo.toml"));
    assert!(deps.iter().any(|d| d == "tern_core"), "{deps:?}");
    assert!(!deps.iter().any(|d| d == "tern"), "`tern_syntax` must not depend on `tern`");
}

#[test]
fn core_crate_has_no_dependencies() {
    let deps = dependency_names(include_str!("../crates/tern_core/Cargo.toml"));
    assert!(deps.is_empty(), "`tern_core` must stay dependency-free, found {deps:?}");
}
