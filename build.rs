fn git(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

/// Release builds report the crate version, anything else `dev@<hash>`.
fn version() -> String {
    if git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some() {
        return std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    }
    match git(&["rev-parse", "--short", "HEAD"]) {
        Some(hash) if !hash.is_empty() => format!("dev@{hash}"),
        _ => "dev@unknown".to_string(),
    }
}

fn main() {
    // Stamp a new version whenever HEAD moves.
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rustc-env=SITEMAKE_VERSION={}", version());
}
