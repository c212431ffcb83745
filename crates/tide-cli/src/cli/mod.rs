use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `tdg` binary.
#[derive(Debug, Parser)]
#[command(name = "tdg", version, about = "Tidings - newsletter intelligence briefings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database file (defaults to store.path from config)
    #[arg(long, global = true)]
    pub db: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["tdg", "--format", "table", "--verbose", "latest"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Latest));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["tdg", "latest", "--format", "raw", "--quiet", "--db", "x.db"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert_eq!(cli.global_flags().db.as_deref(), Some("x.db"));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["tdg", "--format", "xml", "latest"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn run_accepts_explicit_window() {
        let cli = Cli::try_parse_from([
            "tdg",
            "run",
            "--window-start",
            "2026-03-01T00:00:00Z",
            "--window-end",
            "2026-03-02T00:00:00Z",
            "--batch-size",
            "4",
        ])
        .expect("cli should parse");

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(
            args.window_start,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(args.batch_size, Some(4));
    }

    #[test]
    fn run_rejects_lone_window_start() {
        let parsed = Cli::try_parse_from(["tdg", "run", "--window-start", "2026-03-01T00:00:00Z"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn run_rejects_explicit_window_with_hours() {
        let parsed = Cli::try_parse_from([
            "tdg",
            "run",
            "--window-start",
            "2026-03-01T00:00:00Z",
            "--window-end",
            "2026-03-02T00:00:00Z",
            "--window-hours",
            "6",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn archive_limit_defaults_to_twenty() {
        let cli = Cli::try_parse_from(["tdg", "archive"]).expect("cli should parse");
        let Commands::Archive(args) = cli.command else {
            panic!("expected archive command");
        };
        assert_eq!(args.limit, 20);
    }
}
