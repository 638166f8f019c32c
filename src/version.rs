//! Library and API Version
//!
//! Constants generated at build time from Cargo.toml. `API_VERSION` comes from
//! `package.metadata.notifly.api_version` (format YYYYMMDD) and is bumped by hand
//! whenever observer shapes, result codes or bridge entry points change.

include!(concat!(env!("OUT_DIR"), "/version_api.rs"));

/// Library version as `(major, minor, patch)`
pub fn version() -> (u32, u32, u32) {
    (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

/// Library version as a dotted string
pub fn version_string() -> String {
    format!("{}.{}.{}", VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

/// Unpack a `0xMMmmpp` version into its parts
pub fn unpack_version(packed: u32) -> (u32, u32, u32) {
    ((packed >> 16) & 0xff, (packed >> 8) & 0xff, packed & 0xff)
}

/// Convert a YYYYMMDD API version to YYYY-MM-DD
pub fn api_version_date(version: i64) -> Option<String> {
    if !(10000000..=99999999).contains(&version) {
        return None;
    }
    let year = version / 10000;
    let month = (version % 10000) / 100;
    let day = version % 100;
    Some(format!("{year:04}-{month:02}-{day:02}"))
}

/// Whether code built against `required` can use this library
pub fn is_api_compatible(required: i64) -> bool {
    API_VERSION >= required
}

/// Version information as a JSON object
pub fn version_info() -> serde_json::Value {
    serde_json::json!({
        "version": version_string(),
        "packed": format!("0x{:06x}", VERSION),
        "api_version": API_VERSION,
        "api_date": api_version_date(API_VERSION),
    })
}
