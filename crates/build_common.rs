// Shared build script helper that turns a crate README into crate-level rustdoc.
// Pull it into a build.rs with: include!("../build_common.rs");
//
// The including file must import:
//   use std::env;
//   use std::fs;
//   use std::path::Path;

/// Write `README_GENERATED.md` into `OUT_DIR` for `#![doc = include_str!(...)]`.
///
/// Links to `src/<module>.rs` are rewritten to bare module names so rustdoc can
/// resolve them, and `../../README.md` links point at the workspace repository.
/// A crate without a README still gets a one-line document so the
/// `include_str!` in `lib.rs` always resolves.
fn process_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");
    println!("cargo:rerun-if-changed=../../Cargo.toml");

    let readme_path = Path::new(crate_dir).join("README.md");
    let content = fs::read_to_string(&readme_path).unwrap_or_else(|_| {
        let name = env::var("CARGO_PKG_NAME").unwrap_or_default();
        format!("# {name}\n")
    });

    let mut rustdoc_content = content.replace("](src/", "](").replace(".rs)", ")");

    if let Some(url) = workspace_repo_url(crate_dir) {
        rustdoc_content = rustdoc_content.replace("](../../README.md", &format!("]({url}"));
    }

    let out_dir = env::var("OUT_DIR").unwrap();
    fs::write(Path::new(&out_dir).join("README_GENERATED.md"), rustdoc_content).unwrap();
}

/// Read `repository = "..."` from the workspace manifest two levels up.
fn workspace_repo_url(crate_dir: &str) -> Option<String> {
    let workspace_toml = Path::new(crate_dir).parent()?.parent()?.join("Cargo.toml");
    let content = fs::read_to_string(workspace_toml).ok()?;

    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("repository") && line.contains('='))
        .find_map(|line| {
            let start = line.find('"')?;
            let end = line.rfind('"')?;
            (start < end).then(|| line[start + 1..end].to_string())
        })
}
