// Leaf error types, grounded in the same `thiserror` pattern the pack uses
// for parser errors (quarylabs-sqruff's `SQLParseError`/`SQLLexError`).
// `parser::ParseError` lives next to the parser it describes; the rest
// compose here and get wrapped in `anyhow::Result` at the top of `main`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("reading {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    #[error("writing {path}: {source}")]
    Write { path: String, #[source] source: std::io::Error },

    #[error("malformed CSV/TSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON record: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("unknown input format {0:?}")]
    UnknownInputFormat(String),

    #[error("unknown output format {0:?}")]
    UnknownOutputFormat(String),

    #[error("-e/-f expression required for verb {0:?}")]
    MissingExpression(String),

    #[error(transparent)]
    Parse(#[from] crate::parser::ParseError),

    #[error(transparent)]
    Io(#[from] IoError),
}
