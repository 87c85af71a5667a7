use std::{env, path::PathBuf};

// Page location defaults for native builds, baked from `.env`.
const BAKED_KEYS: &[&str] = &["DEBUG_OVERLAY_QUERY", "DEBUG_OVERLAY_ORIGIN"];

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let env_path = PathBuf::from(&manifest_dir).join(".env");

    println!("cargo:rerun-if-changed={}", env_path.display());

    if env_path.exists() {
        for item in dotenvy::from_path_iter(&env_path).expect("Failed to read .env file") {
            let (key, val) = item.expect("Failed to parse .env entry");
            if BAKED_KEYS.contains(&key.as_str()) {
                println!("cargo:rustc-env={}={}", key, val);
            }
        }
    }
}
