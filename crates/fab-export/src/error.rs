use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid correction pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("component {reference}: missing required netlist field '{field}'")]
    MissingField { reference: String, field: String },

    #[error("component {0} is in the netlist but not on the board")]
    MissingOnBoard(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
