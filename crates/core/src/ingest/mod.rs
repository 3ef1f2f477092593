pub mod mock;
pub mod provider;
pub mod source;
pub mod types;

pub use source::{KeywordSource, ProviderOutcome};
