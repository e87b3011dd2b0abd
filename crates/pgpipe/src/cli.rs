//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

pub use crate::commands::dump::DumpArgs;
pub use crate::commands::restore::RestoreArgs;

/// pgpipe - stream PostgreSQL dumps and restore them from remote archives
#[derive(Parser, Debug)]
#[command(name = "pgpipe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors and warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config file (default: ~/.pgpipe/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List supported PostgreSQL versions
    Versions(VersionsArgs),

    /// Check that a database accepts connections
    Ping(PingArgs),

    /// Stream a dump to a file or stdout
    Dump(DumpArgs),

    /// Restore a dump from a remote ZIP archive
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Database and toolchain selection shared by every database command
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// PostgreSQL major version of the client tools (13, 14, 15, 16)
    #[arg(long = "pg-version", value_name = "VERSION")]
    pub pg_version: String,

    /// Connection string or database name passed to pg_dump/psql
    #[arg(long, env = "PGPIPE_CONNECTION", hide_env_values = true)]
    pub connection: String,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dump_flags() {
        let cli = Cli::try_parse_from([
            "pgpipe",
            "dump",
            "--pg-version",
            "15",
            "--connection",
            "postgres://localhost/app",
            "--clean",
            "--if-exists",
            "--zip",
            "-o",
            "backup.zip",
        ])
        .unwrap();

        match cli.command {
            Commands::Dump(args) => {
                assert_eq!(args.target.pg_version, "15");
                assert!(args.clean && args.if_exists && args.zip);
                assert!(!args.data_only);
                assert_eq!(args.output.as_deref().map(|p| p.as_str()), Some("backup.zip"));
            }
            other => panic!("expected dump, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_restore() {
        let cli = Cli::try_parse_from([
            "pgpipe",
            "-v",
            "restore",
            "--pg-version",
            "16",
            "--connection",
            "app",
            "https://example.com/dump.zip",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Restore(args) => assert_eq!(args.url, "https://example.com/dump.zip"),
            other => panic!("expected restore, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pgpipe", "versions", "--json", "-q", "-c", "pg.yaml"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config.as_deref().map(|p| p.as_str()), Some("pg.yaml"));
    }
}
