//! Build script for the storefront crate.
//!
//! Generates content-based hashes for static assets (CSS and JS) so they can
//! be served with immutable caching.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let static_dir = Path::new(&manifest_dir).join("static");

    hash_asset(&static_dir, "css", "main", "CSS_HASH");
    hash_asset(&static_dir, "js", "app", "JS_HASH");
}

/// Hash `static/{kind}/{name}.{kind}` and copy it to
/// `static/{kind}/derived/{name}.{hash}.{kind}`.
///
/// Sets `env_var` to the short hash, or to an empty string when the asset is
/// missing.
fn hash_asset(static_dir: &Path, kind: &str, name: &str, env_var: &str) {
    let source = static_dir.join(kind).join(format!("{name}.{kind}"));
    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", source.display());
            println!("cargo:rustc-env={env_var}=");
            return;
        }
    };

    // First 8 hex chars of SHA-256
    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = hash.get(..8).unwrap_or(&hash);
    println!("cargo:rustc-env={env_var}={short_hash}");

    let derived_dir = static_dir.join(kind).join("derived");
    let derived_path = derived_dir.join(format!("{name}.{short_hash}.{kind}"));
    if let Err(e) = fs::create_dir_all(&derived_dir).and_then(|()| fs::copy(&source, &derived_path))
    {
        println!("cargo:warning=Could not write {}: {e}", derived_path.display());
    }
}
