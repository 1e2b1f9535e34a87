// CLI surface, grounded in quarylabs-sqruff's `cli-lib/src/commands.rs`
// subcommand-struct shape, simplified to this tool's two verbs.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "fluent-records", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Numeric output format applied to `Double` values on emission.
    #[arg(long, global = true, default_value = "%lf")]
    pub ofmt: String,

    /// Input record format.
    #[arg(long = "from", global = true, default_value_t = Format::Dkvp)]
    pub input_format: Format,

    /// Output record format.
    #[arg(long = "to", global = true, default_value_t = Format::Dkvp)]
    pub output_format: Format,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Transform records by running a put-DSL program over each one")]
    Put(VerbArgs),
    #[command(about = "Keep only the records for which a boolean expression is true")]
    Filter(VerbArgs),
}

#[derive(Debug, Parser)]
pub struct VerbArgs {
    /// DSL source text, given directly on the command line.
    #[arg(short = 'e', long = "expression")]
    pub expression: Option<String>,

    /// DSL source text, read from a file.
    #[arg(short = 'f', long = "file")]
    pub script: Option<PathBuf>,

    /// Input files; `-` or omitted reads stdin.
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Dkvp,
    Csv,
    Json,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Format::Dkvp => "dkvp",
            Format::Csv => "csv",
            Format::Json => "json",
        };
        f.write_str(s)
    }
}
