//! Stamps reports with the commit and date the binary was built from.
//!
//! `BUILD_COMMIT` and `BUILD_DATE` in the environment win over git and the
//! clock, so packaged builds are reproducible.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

const UNKNOWN_COMMIT: &str = "unknown";

fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn stamp(var: &str, fallback: impl FnOnce() -> String) -> String {
    println!("cargo:rerun-if-env-changed={var}");
    env::var(var).unwrap_or_else(|_| fallback())
}

fn main() -> io::Result<()> {
    let commit = stamp("BUILD_COMMIT", || {
        short_commit().unwrap_or_else(|| UNKNOWN_COMMIT.to_string())
    });
    let date = stamp("BUILD_DATE", || chrono::Utc::now().format("%Y-%m-%d").to_string());

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR not set"))?;
    fs::write(
        out_dir.join("build_info.rs"),
        format!("pub const BUILD_COMMIT: &str = {commit:?};\npub const BUILD_DATE: &str = {date:?};\n"),
    )?;

    println!("cargo:rerun-if-changed=build.rs");
    if Path::new(".git/HEAD").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
    }
    Ok(())
}
