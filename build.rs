use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let version_api_path = Path::new(&out_dir).join("version_api.rs");

    // Read API version from Cargo.toml metadata
    let cargo_manifest = env::var("CARGO_MANIFEST_DIR").unwrap();
    let cargo_toml_path = Path::new(&cargo_manifest).join("Cargo.toml");
    let cargo_toml_content = fs::read_to_string(&cargo_toml_path)
        .expect("Failed to read Cargo.toml");

    let cargo_toml: toml::Value = cargo_toml_content.parse()
        .expect("Failed to parse Cargo.toml");

    let api_version = cargo_toml
        .get("package")
        .and_then(|p| p.get("metadata"))
        .and_then(|m| m.get("notifly"))
        .and_then(|n| n.get("api_version"))
        .and_then(|v| v.as_integer())
        .expect("Failed to find package.metadata.notifly.api_version in Cargo.toml");

    let major: u32 = env::var("CARGO_PKG_VERSION_MAJOR").unwrap().parse().unwrap();
    let minor: u32 = env::var("CARGO_PKG_VERSION_MINOR").unwrap().parse().unwrap();
    let patch: u32 = env::var("CARGO_PKG_VERSION_PATCH").unwrap().parse().unwrap();

    let version_content = format!(
        "// Auto-generated from Cargo.toml by build.rs\n\
         pub const API_VERSION: i64 = {api};\n\
         pub const VERSION_MAJOR: u32 = {major};\n\
         pub const VERSION_MINOR: u32 = {minor};\n\
         pub const VERSION_PATCH: u32 = {patch};\n\
         pub const VERSION: u32 = 0x{packed:06x};\n",
        api = api_version,
        major = major,
        minor = minor,
        patch = patch,
        packed = (major << 16) | (minor << 8) | patch,
    );

    fs::write(&version_api_path, version_content)
        .expect("Failed to write version_api.rs");

    println!("cargo:rerun-if-changed=Cargo.toml");
}
