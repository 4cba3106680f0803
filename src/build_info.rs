//! Compile-time build information.

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// `shadow-monarch <version> (<date>, <commit>)`, as printed by `--version`.
/// Non-release builds append their profile.
pub fn version_string() -> String {
    let tag = if BUILD_PROFILE == "release" {
        String::new()
    } else {
        format!(" [{}]", BUILD_PROFILE)
    };
    format!(
        "shadow-monarch {} ({}, {}){}",
        env!("CARGO_PKG_VERSION"),
        BUILD_DATE,
        BUILD_COMMIT,
        tag
    )
}
