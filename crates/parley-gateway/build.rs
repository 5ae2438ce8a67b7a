use std::process::Command;

// Exposes PARLEY_GIT_SHA to the crate. A value already set in the build
// environment wins, for builds from a source tarball without .git.
fn main() {
    println!("cargo:rerun-if-env-changed=PARLEY_GIT_SHA");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    let sha = std::env::var("PARLEY_GIT_SHA")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(git_short_sha)
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=PARLEY_GIT_SHA={sha}");
}

fn git_short_sha() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8(out.stdout).ok()?;
    Some(sha.trim().to_owned())
}
