use std::path::Path;
use std::process::Command;

/// Short commit of the workspace checkout, if it is one
fn git_short_sha(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
    let workspace = Path::new(&manifest).join("..");
    let sha = git_short_sha(&workspace).unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=FEELEDGER_BUILD_SHA={sha}");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
