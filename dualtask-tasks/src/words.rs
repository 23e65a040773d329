use crate::config::Difficulty;
use crate::error::TaskError;
use dualtask_cache::{intern_word, Atom};
use std::path::Path;

/// Immutable stimulus vocabulary for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct WordList {
    words: Vec<Atom>,
}

impl WordList {
    /// Reads the list for `difficulty` from `dir`. A missing or unreadable
    /// file is an error; there is no fallback vocabulary.
    pub fn load(dir: &Path, difficulty: Difficulty) -> Result<Self, TaskError> {
        let path = dir.join(difficulty.file_name());
        let text = std::fs::read_to_string(&path).map_err(|source| TaskError::WordList {
            path: path.clone(),
            source,
        })?;
        let list = Self::parse(&text, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            words = list.len(),
            "loaded word list"
        );
        Ok(list)
    }

    /// One word per line; blank lines are skipped.
    pub fn parse(text: &str, origin: &str) -> Result<Self, TaskError> {
        Self::from_words(text.lines(), origin)
    }

    pub fn from_words<I, S>(words: I, origin: &str) -> Result<Self, TaskError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<Atom> = words
            .into_iter()
            .filter(|w| !w.as_ref().trim().is_empty())
            .map(|w| intern_word(w.as_ref()))
            .collect();
        if words.is_empty() {
            return Err(TaskError::EmptyWordList {
                origin: origin.to_string(),
            });
        }
        Ok(Self { words })
    }

    pub fn get(&self, index: usize) -> Option<&Atom> {
        self.words.get(index)
    }

    pub fn position(&self, word: &Atom) -> Option<usize> {
        self.words.iter().position(|w| w == word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        self.words.iter()
    }
}
