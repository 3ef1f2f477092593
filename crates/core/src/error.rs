use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Rejected before any provider call.
    Input(String),
    /// Every keyword fetch failed.
    NoValidData,
    /// Only produced when persistence was requested.
    Persistence(String),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::NoValidData => "no_valid_data",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(detail) => write!(f, "invalid request: {detail}"),
            Self::NoValidData => write!(f, "no valid keyword data could be fetched"),
            Self::Persistence(detail) => write!(f, "failed to save niches: {detail}"),
        }
    }
}

impl std::error::Error for AnalysisError {}
