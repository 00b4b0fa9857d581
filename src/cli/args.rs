//! Command line argument parsing for the fathom CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::index::DistanceUnit;

/// Fathom - policy-driven document indexing and search
#[derive(Parser, Debug, Clone)]
#[command(name = "fathom")]
#[command(about = "Index JSON documents under a policy and search them")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct FathomArgs {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Platform configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "FATHOM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl FathomArgs {
    /// Effective verbosity: 0 quiet, 1 default, 2 verbose, 3 and up debug.
    pub fn verbosity(&self) -> u8 {
        if self.quiet { 0 } else { self.verbose.saturating_add(1) }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index a JSONL file under an index policy and report the outcome
    Index(IndexArgs),

    /// Index a JSONL file and run one query against it
    Search(SearchArgs),
}

/// Where the policy and the documents come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Index policy file (JSON attribute map)
    #[arg(value_name = "POLICY_FILE")]
    pub policy: PathBuf,

    /// Documents, one JSON object per line
    #[arg(value_name = "DOCUMENTS_FILE")]
    pub documents: PathBuf,

    /// Index and database name (defaults to the documents file stem)
    #[arg(short, long)]
    pub name: Option<String>,
}

impl SourceArgs {
    pub fn index_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.documents
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "documents".to_string())
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Keywords to search for
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Query policy file (JSON attribute map); all fields are searched without one
    #[arg(long, value_name = "QUERY_POLICY_FILE")]
    pub query_policy: Option<PathBuf>,

    /// Return every document instead of matching keywords
    #[arg(long, conflicts_with = "keywords")]
    pub all: bool,

    /// Rank by the indexed document score only
    #[arg(long)]
    pub score_only: bool,

    /// Exact-match filter, repeatable
    #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Center of a spatial search
    #[arg(long, num_args = 2, value_names = ["LAT", "LNG"], allow_negative_numbers = true)]
    pub near: Option<Vec<f64>>,

    /// Radius of the spatial search
    #[arg(long, default_value = "10")]
    pub radius: f64,

    /// Unit of the radius
    #[arg(long, default_value = "miles")]
    pub unit: UnitArg,

    /// Only documents visible to this owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Return stored fields with each hit
    #[arg(long)]
    pub detailed: bool,

    /// Suggest a spelling correction when nothing matches
    #[arg(long)]
    pub suggest: bool,

    /// Offset of the first hit
    #[arg(short, long, default_value = "0")]
    pub start: usize,

    /// Maximum number of hits
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitArg {
    Miles,
    Kilometers,
}

impl From<UnitArg> for DistanceUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Miles => DistanceUnit::Miles,
            UnitArg::Kilometers => DistanceUnit::Kilometers,
        }
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = FathomArgs::try_parse_from(["fathom", "index", "p.json", "d.jsonl"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args =
            FathomArgs::try_parse_from(["fathom", "-vv", "index", "p.json", "d.jsonl"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args =
            FathomArgs::try_parse_from(["fathom", "-v", "-q", "index", "p.json", "d.jsonl"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_index_name_defaults_to_file_stem() {
        let args =
            FathomArgs::try_parse_from(["fathom", "index", "policy.json", "data/books.jsonl"])
                .unwrap();
        let Command::Index(index) = args.command else {
            panic!("expected index command");
        };
        assert_eq!(index.source.index_name(), "books");
    }

    #[test]
    fn test_search_arguments() {
        let args = FathomArgs::try_parse_from([
            "fathom",
            "--format",
            "json",
            "search",
            "policy.json",
            "venues.jsonl",
            "--near",
            "40.7",
            "-73.9",
            "--radius",
            "5",
            "--unit",
            "kilometers",
            "--filter",
            "kind=bar",
            "--all",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        let Command::Search(search) = args.command else {
            panic!("expected search command");
        };
        assert_eq!(search.near, Some(vec![40.7, -73.9]));
        assert_eq!(search.radius, 5.0);
        assert_eq!(search.unit, UnitArg::Kilometers);
        assert_eq!(search.filters, vec![("kind".to_string(), "bar".to_string())]);
        assert!(search.all);
    }

    #[test]
    fn test_bad_filter_rejected() {
        let result = FathomArgs::try_parse_from([
            "fathom", "search", "p.json", "d.jsonl", "--filter", "novalue",
        ]);
        assert!(result.is_err());
    }
}
