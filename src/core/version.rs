//! Build metadata generated by the build script

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Crate version as declared in Cargo.toml
pub fn package_version() -> &'static str {
    PACKAGE_VERSION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// One-line version banner, e.g. `0.1.0 (a1b2c3d, built 2025-01-31 12:00:00 UTC)`
pub fn version_banner() -> String {
    format!("{} ({}, built {})", PACKAGE_VERSION, GIT_HASH, BUILD_TIME)
}
