use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tokio::fs;

/// Word-validity oracle consulted when a selection is released
pub trait WordOracle {
    /// Whether the oracle can answer yet. Words are rejected until it can.
    fn is_ready(&self) -> bool {
        true
    }

    fn is_valid(&self, word: &str) -> bool;
}

pub struct Dictionary {
    words: HashSet<String>,
}

impl Dictionary {
    /// Load dictionary from a file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let dictionary = Self::from_words(content.lines());

        tracing::info!("Loaded {} words into dictionary", dictionary.len());

        Ok(dictionary)
    }

    /// Load from a file, falling back to an empty dictionary so the game
    /// still starts without a word list
    pub async fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path).await {
            Ok(dict) => {
                tracing::info!("Dictionary loaded successfully");
                dict
            }
            Err(e) => {
                tracing::warn!("Failed to load dictionary: {}. Using empty dictionary.", e);
                tracing::warn!(
                    "Download a word list to {} for full functionality",
                    path.display()
                );
                Self::empty()
            }
        }
    }

    /// Build a dictionary from an in-memory word list
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|line| line.as_ref().trim().to_uppercase())
            .filter(|word| !word.is_empty() && word.len() >= 2)
            .collect();
        Self { words }
    }

    /// Create an empty dictionary (for testing)
    pub fn empty() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    /// Check if a word exists in the dictionary
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_uppercase())
    }

    /// Get the number of words in the dictionary
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordOracle for Dictionary {
    fn is_valid(&self, word: &str) -> bool {
        self.contains(word)
    }
}

/// A dictionary that arrives later, typically from a background load.
/// Cloned handles share the same slot.
#[derive(Clone, Default)]
pub struct PendingDictionary {
    slot: Arc<OnceCell<Dictionary>>,
}

impl PendingDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the loaded dictionary. Returns false if one was already installed.
    pub fn fulfil(&self, dictionary: Dictionary) -> bool {
        match self.slot.set(dictionary) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!("Dictionary already installed, ignoring second load");
                false
            }
        }
    }
}

impl WordOracle for PendingDictionary {
    fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    fn is_valid(&self, word: &str) -> bool {
        self.slot
            .get()
            .map(|dictionary| dictionary.contains(word))
            .unwrap_or(false)
    }
}

impl<T: WordOracle + ?Sized> WordOracle for Arc<T> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn is_valid(&self, word: &str) -> bool {
        (**self).is_valid(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dictionary() {
        let dict = Dictionary::empty();
        assert!(dict.is_empty());
        assert!(!dict.contains("TEST"));
    }

    #[test]
    fn test_from_words_normalises() {
        let dict = Dictionary::from_words(["cat", "  Dog ", "a", ""]);
        assert_eq!(dict.len(), 2);
        assert!(dict.contains("CAT"));
        assert!(dict.is_valid("dog"));
        assert!(!dict.contains("A"));
    }

    #[test]
    fn test_pending_dictionary_rejects_until_ready() {
        let pending = PendingDictionary::new();
        let handle = pending.clone();
        assert!(!handle.is_ready());
        assert!(!handle.is_valid("CAT"));

        assert!(pending.fulfil(Dictionary::from_words(["cat"])));
        assert!(handle.is_ready());
        assert!(handle.is_valid("CAT"));
        assert!(!pending.fulfil(Dictionary::empty()));
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let result = Dictionary::load("./definitely-not-here.txt").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_or_empty_falls_back() {
        let dict = Dictionary::load_or_empty("./definitely-not-here.txt").await;
        assert!(dict.is_empty());
    }
}
