//! CLI argument definitions for the ESG field mapper.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "esg-field-mapper",
    version,
    about = "Map spreadsheet headers onto ESG entity fields",
    long_about = "Map spreadsheet column headers onto the fields of an ESG entity.\n\n\
                  Headers are matched against a built-in alias dictionary, optionally\n\
                  extended per company. Headers the heuristics cannot place can be sent\n\
                  to a chat-completions endpoint when ESG_AI_API_KEY is set."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map a list of headers onto an entity.
    Map(MapArgs),

    /// List the entities known to the alias dictionary.
    Entities(EntitiesArgs),

    /// Run the HTTP field mapping service.
    Serve(ServeArgs),
}

/// Options shared by commands that build a mapping engine.
#[derive(Args)]
pub struct EngineArgs {
    /// Directory of per-company alias override files.
    #[arg(long = "aliases-dir", value_name = "DIR")]
    pub aliases_dir: Option<PathBuf>,

    /// Never call the AI fallback, even when ESG_AI_API_KEY is set.
    #[arg(long = "no-ai")]
    pub no_ai: bool,
}

#[derive(Parser)]
pub struct MapArgs {
    /// Target entity (e.g. waste_logs, suppliers).
    #[arg(long = "entity", short = 'e', value_name = "ENTITY")]
    pub entity: String,

    /// Company whose alias overrides apply.
    #[arg(long = "company", value_name = "ID", default_value = "default")]
    pub company: String,

    /// Comma-separated headers.
    #[arg(
        long = "headers",
        value_name = "LIST",
        conflicts_with = "csv",
        required_unless_present = "csv"
    )]
    pub headers: Option<String>,

    /// Read headers from the first row of a CSV file.
    #[arg(long = "csv", value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Minimum confidence for an accepted mapping.
    #[arg(
        long = "high",
        value_name = "SCORE",
        default_value_t = 0.8,
        value_parser = parse_score
    )]
    pub high: f64,

    /// Minimum confidence for a suggestion.
    #[arg(
        long = "suggest",
        value_name = "SCORE",
        default_value_t = 0.7,
        value_parser = parse_score
    )]
    pub suggest: f64,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Parser)]
pub struct EntitiesArgs {
    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Include the overrides of this company (requires --aliases-dir).
    #[arg(long = "company", value_name = "ID", requires = "aliases_dir")]
    pub company: Option<String>,

    /// Directory of per-company alias override files.
    #[arg(long = "aliases-dir", value_name = "DIR")]
    pub aliases_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ServeArgs {
    /// Address to listen on (default: $ESG_HTTP_BIND or 127.0.0.1:8080).
    #[arg(long = "bind", value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// Parses a confidence threshold in `[0, 1]`.
fn parse_score(value: &str) -> Result<f64, String> {
    let score: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !(0.0..=1.0).contains(&score) {
        return Err(format!("'{value}' must be between 0 and 1"));
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args.iter().copied())
    }

    #[test]
    fn score_must_be_a_finite_fraction() {
        assert_eq!(parse_score("0.85"), Ok(0.85));
        assert_eq!(parse_score("1"), Ok(1.0));
        assert!(parse_score("NaN").is_err());
        assert!(parse_score("inf").is_err());
        assert!(parse_score("1.2").is_err());
        assert!(parse_score("-0.1").is_err());
        assert!(parse_score("high").is_err());
    }

    #[test]
    fn map_rejects_nan_threshold() {
        let base = ["esg-field-mapper", "map", "--entity", "waste_logs", "--headers", "Obs"];
        let mut args = base.to_vec();
        args.extend(["--high", "NaN"]);
        assert!(parse(&args).is_err());

        let mut args = base.to_vec();
        args.extend(["--suggest", "nan"]);
        assert!(parse(&args).is_err());

        let cli = parse(&base).expect("defaults parse");
        let Command::Map(map) = cli.command else {
            panic!("expected map command");
        };
        assert_eq!((map.high, map.suggest), (0.8, 0.7));
    }
}
