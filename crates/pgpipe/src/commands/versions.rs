//! Versions command

use crate::cli::VersionsArgs;
use anyhow::Result;
use camino::Utf8Path;
use pgpipe_core::{PgVersion, RuntimeConfig};
use serde::Serialize;

/// One supported version and where its executables are expected
#[derive(Debug, Serialize)]
struct VersionEntry {
    version: &'static str,
    pg_dump: String,
    psql: String,
    installed: bool,
}

fn entries(config: &RuntimeConfig) -> Vec<VersionEntry> {
    PgVersion::ALL
        .iter()
        .map(|version| {
            let capability = config.capability(*version);
            VersionEntry {
                version: version.as_str(),
                pg_dump: capability.producer().to_string(),
                psql: capability.consumer().to_string(),
                installed: capability.producer().is_file() && capability.consumer().is_file(),
            }
        })
        .collect()
}

pub fn run(args: VersionsArgs, config: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config)?;
    let entries = entries(&config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let marker = if entry.installed { "installed" } else { "missing" };
        println!("{:<4} {:<10} {}", entry.version, marker, entry.pg_dump);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_entries_cover_all_versions() {
        let entries = entries(&RuntimeConfig::default());
        let versions: Vec<_> = entries.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec!["13", "14", "15", "16"]);
        assert_eq!(entries[0].pg_dump, "/usr/lib/postgresql/13/bin/pg_dump");
        assert_eq!(entries[3].psql, "/usr/lib/postgresql/16/bin/psql");
    }

    #[test]
    fn test_installed_detection() {
        let root = tempfile::TempDir::new().unwrap();
        let bin = root.path().join("14").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("pg_dump"), "").unwrap();
        std::fs::write(bin.join("psql"), "").unwrap();

        let mut config = RuntimeConfig::default();
        config.toolchain.bin_root = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).unwrap();

        let installed: Vec<_> = entries(&config)
            .into_iter()
            .filter(|e| e.installed)
            .map(|e| e.version)
            .collect();
        assert_eq!(installed, vec!["14"]);
    }

    #[test]
    fn test_json_shape() {
        let root = tempfile::TempDir::new().unwrap();
        let mut config = RuntimeConfig::default();
        config.toolchain.bin_root = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).unwrap();

        let json = serde_json::to_value(entries(&config)).unwrap();
        assert_eq!(json[2]["version"], "15");
        assert_eq!(json[2]["installed"], false);
        assert_eq!(
            json[2]["pg_dump"].as_str().unwrap(),
            config.toolchain.bin_root.join("15/bin/pg_dump").as_str()
        );
    }
}
