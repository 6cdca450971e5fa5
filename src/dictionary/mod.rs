// Public API
pub use cache::{CachedOracle, DEFAULT_DEFINITION_TTL};
pub use oracle::{DictionaryOracle, WordListOracle};

// Internal modules
mod cache;
mod oracle;
