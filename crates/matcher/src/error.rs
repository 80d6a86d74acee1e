use std::fmt;

#[derive(Debug)]
pub enum MatchError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (missing source, bad threshold, etc.).
    ConfigValidation(String),
    /// A mapped column is absent from the source's CSV header.
    MissingColumn { source: String, column: String },
    /// CSV read or write error.
    Csv { source: String, message: String },
    /// A scorer could not produce scores at all (as opposed to a single bad cell).
    Scorer(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::Csv { source, message } => write!(f, "source '{source}': CSV error: {message}"),
            Self::Scorer(msg) => write!(f, "scorer error: {msg}"),
        }
    }
}

impl std::error::Error for MatchError {}
