#![allow(dead_code, unreachable_pub)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const SECRET_KEY: &str = "0123456789abcdef0123456789abcdef";

pub const CACHET_TOML: &str = r#"
[log]
level = "debug"
filter = "cachet_http=trace,info"

[session]
max-age = "1day"
refresh = "30m"
header-scheme = "Bearer"

[session.container]
key = "0123456789abcdef0123456789abcdef"

[session.cookie]
name = "sid"
same-site = "lax"

[csrf]
key = "0123456789abcdef0123456789abcdef"
ttl = "2h"
methods = ["post", "patch"]
"#;

/// Writes `contents` to `name` inside a fresh temporary directory.
/// # Panics
/// * If the file cannot be written.
#[must_use]
pub fn write_config(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("config file");
    (dir, path)
}
