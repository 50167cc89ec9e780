//! Generates `$OUT_DIR/version.rs` with the package version, build time and
//! git revision that `core::version` exposes.

use chrono::Utc;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const UNKNOWN: &str = "unknown";

struct BuildInfo {
    package_version: String,
    build_time: String,
    git_hash: String,
}

impl BuildInfo {
    fn collect(manifest: &Path) -> Self {
        Self {
            package_version: manifest_version(manifest),
            build_time: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            git_hash: git_short_hash(),
        }
    }

    fn render(&self) -> String {
        format!(
            "pub const PACKAGE_VERSION: &str = {:?};\npub const BUILD_TIME: &str = {:?};\npub const GIT_HASH: &str = {:?};\n",
            self.package_version, self.build_time, self.git_hash
        )
    }
}

/// `[package] version` from Cargo.toml
fn manifest_version(manifest: &Path) -> String {
    fs::read_to_string(manifest)
        .ok()
        .and_then(|contents| contents.parse::<toml::Table>().ok())
        .and_then(|table| {
            table
                .get("package")?
                .get("version")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn git_short_hash() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let manifest = Path::new(&manifest_dir).join("Cargo.toml");

    let info = BuildInfo::collect(&manifest);
    fs::write(out_dir.join("version.rs"), info.render()).expect("write version.rs");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
