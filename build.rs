//! Build script to track include_str! dependencies.
//! This ensures cargo rebuilds when the embedded default config changes.

fn main() {
    println!("cargo:rerun-if-changed=resources/config.json");
}
