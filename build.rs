use std::{env, path::PathBuf};

const BAKED_PREFIX: &str = "LOG_API_";

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let env_path = PathBuf::from(&manifest_dir).join(".env");

    println!("cargo:rerun-if-changed={}", env_path.display());

    if !env_path.exists() {
        eprintln!("Warning: .env file not found at {}, using built-in API defaults", env_path.display());
        return;
    }

    for item in dotenvy::from_path_iter(&env_path).expect("Failed to read .env file") {
        let (key, val) = item.expect("Failed to parse .env entry");
        // Only the dashboard's own settings end up in the binary.
        if key.starts_with(BAKED_PREFIX) {
            println!("cargo:rustc-env={}={}", key, val);
        }
    }
}
