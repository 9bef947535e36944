use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Resolve destination columns for tabular exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve every configured column for every source row and write CSV
    Resolve(ResolveArgs),
    /// Resolve the first few rows and print them as a formatted table
    Preview(PreviewArgs),
    /// Validate a column configuration against the datasets it targets
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Source CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column configuration file (.yaml or .json)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Base CSV file supplying mapping lookup values
    #[arg(short = 'b', long = "base")]
    pub base: Option<PathBuf>,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Limit the number of resolved rows
    #[arg(long)]
    pub limit: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Output delimiter (defaults to the input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Source CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column configuration file (.yaml or .json)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Base CSV file supplying mapping lookup values
    #[arg(short = 'b', long = "base")]
    pub base: Option<PathBuf>,
    /// Number of rows to preview
    #[arg(short = 'n', long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Source CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column configuration file (.yaml or .json)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Base CSV file supplying mapping lookup values
    #[arg(short = 'b', long = "base")]
    pub base: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw {
        "tab" | "\\t" => Ok(b'\t'),
        value if value.len() == 1 && value.is_ascii() => Ok(value.as_bytes()[0]),
        other => Err(format!(
            "Unsupported delimiter '{other}'; use a single ASCII character or 'tab'"
        )),
    }
}
