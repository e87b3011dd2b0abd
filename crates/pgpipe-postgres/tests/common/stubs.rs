//! Stub executables for process tests
//!
//! Each stub is a `/bin/sh` script written into a temp dir and marked
//! executable. Tests spawning stubs run `#[serial]` so that no other test
//! thread forks while a freshly written script is still open.

use camino::Utf8PathBuf;
use pgpipe_core::{PgVersion, VersionCapability};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write an executable shell script named `name` into `dir`
pub fn write_stub(dir: &Path, name: &str, body: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    super::utf8(&path)
}

/// Capability bound to explicit stub paths
pub fn stub_capability(producer: Utf8PathBuf, consumer: Utf8PathBuf) -> VersionCapability {
    VersionCapability::new(PgVersion::V16, producer, consumer)
}

/// Lays out `<root>/16/bin/{pg_dump,psql}` the way a real install does
pub fn stub_install(root: &Path, pg_dump: &str, psql: &str) {
    let bin = root.join("16").join("bin");
    fs::create_dir_all(&bin).unwrap();
    write_stub(&bin, "pg_dump", pg_dump);
    write_stub(&bin, "psql", psql);
}

/// Producer printing each argument on its own line
pub const ECHO_ARGS: &str = r#"for arg in "$@"; do printf '%s\n' "$arg"; done"#;

/// Whether a process with `pid` still exists
pub fn process_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
