use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::info;

/// Word-validity oracle.
///
/// `Some(definitions)` means the word exists (the definition list may be
/// empty when the backing source has no prose); `None` is a negative
/// result. Lookups are case-insensitive.
#[async_trait]
pub trait DictionaryOracle: Send + Sync {
    async fn lookup(&self, word: &str) -> Option<Vec<String>>;
}

/// Oracle backed by a plain word list, one word per line.
///
/// Carries no definitions; every confirmed word maps to an empty list.
pub struct WordListOracle {
    words: HashSet<String>,
}

impl WordListOracle {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// Loads a word list file: one word per line, blank lines and lines
    /// starting with '#' ignored.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let contents = std::fs::read_to_string(&path)?;
        let oracle = Self::from_words(
            contents
                .lines()
                .filter(|line| !line.trim_start().starts_with('#')),
        );
        info!(
            path = %path.as_ref().display(),
            words = oracle.len(),
            "Loaded word list"
        );
        Ok(oracle)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[async_trait]
impl DictionaryOracle for WordListOracle {
    async fn lookup(&self, word: &str) -> Option<Vec<String>> {
        if self.words.contains(&word.to_lowercase()) {
            Some(Vec::new())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_word_list_lookup_is_case_insensitive() {
        let oracle = WordListOracle::from_words(["Cat", "dog"]);
        assert_eq!(oracle.len(), 2);

        assert!(oracle.lookup("CAT").await.is_some());
        assert!(oracle.lookup("cat").await.is_some());
        assert!(oracle.lookup("DOG").await.is_some());
        assert!(oracle.lookup("bird").await.is_none());
    }

    #[tokio::test]
    async fn test_blank_entries_are_dropped() {
        let oracle = WordListOracle::from_words(["cat", "", "  "]);
        assert_eq!(oracle.len(), 1);
        assert!(oracle.lookup("").await.is_none());
    }
}
