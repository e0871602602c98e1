//! Splitting lines into words and deciding which words count.

use std::collections::HashSet;
use std::io::BufRead;

/// Outcome of cleaning a single raw word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A word that is counted
    Valid,
    /// Nothing alphanumeric was left after cleaning
    RejectedEmpty,
    /// Only digits were left after cleaning
    RejectedAllDigits,
    /// The cleaned word is a stop word
    RejectedStopWord,
}

impl Classification {
    /// Whether the word should be counted
    pub fn is_valid(self) -> bool {
        self == Classification::Valid
    }
}

/// Tokenizes lines and classifies words.
///
/// Workers share one cleaner, so implementations must be `Sync` and must not
/// rely on interior mutability for correctness.
pub trait WordCleaner: Send + Sync {
    /// Split a line into raw words
    fn tokenize<'a>(&self, line: &'a str) -> Vec<&'a str> {
        line.split_whitespace().collect()
    }

    /// Normalize a raw word and classify the result
    fn clean(&self, raw: &str) -> (String, Classification);

    /// The normalized valid words of a line, in order, duplicates included
    fn valid_words(&self, line: &str) -> Vec<String> {
        self.tokenize(line)
            .into_iter()
            .filter_map(|raw| {
                let (word, class) = self.clean(raw);
                class.is_valid().then_some(word)
            })
            .collect()
    }
}

/// Lowercases, strips non-alphanumerics, and rejects numbers and stop words
#[derive(Debug, Default, Clone)]
pub struct StandardCleaner {
    stop_words: HashSet<String>,
}

impl StandardCleaner {
    /// A cleaner without stop words
    pub fn new() -> Self {
        Self::default()
    }

    /// A cleaner rejecting the given stop words (normalized before use)
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = words
            .into_iter()
            .map(|w| normalize(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { stop_words }
    }

    /// Read stop words from a reader, any number of words per line
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut words = Vec::new();
        for line in reader.lines() {
            let line = line?;
            words.extend(line.split_whitespace().map(str::to_owned));
        }
        Ok(Self::with_stop_words(words))
    }

    /// Number of distinct stop words
    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}

impl WordCleaner for StandardCleaner {
    fn clean(&self, raw: &str) -> (String, Classification) {
        let word = normalize(raw);
        let class = if word.is_empty() {
            Classification::RejectedEmpty
        } else if word.chars().all(char::is_numeric) {
            Classification::RejectedAllDigits
        } else if self.stop_words.contains(&word) {
            Classification::RejectedStopWord
        } else {
            Classification::Valid
        };
        (word, class)
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_normalizes() {
        let cleaner = StandardCleaner::new();
        let cases = [
            ("Hello", "hello", Classification::Valid),
            ("F4T417Y", "f4t417y", Classification::Valid),
            ("trailingspace ", "trailingspace", Classification::Valid),
            (" leadingspace", "leadingspace", Classification::Valid),
            ("don't!", "dont", Classification::Valid),
            ("   ", "", Classification::RejectedEmpty),
            ("--", "", Classification::RejectedEmpty),
            ("1234567890", "1234567890", Classification::RejectedAllDigits),
            ("1000.01", "100001", Classification::RejectedAllDigits),
            ("10,000", "10000", Classification::RejectedAllDigits),
        ];
        for (input, expected, class) in cases {
            assert_eq!(cleaner.clean(input), (expected.to_string(), class), "{input:?}");
        }
    }

    #[test]
    fn test_stop_words() {
        let cleaner = StandardCleaner::with_stop_words(["The", "a", "!!"]);
        assert_eq!(cleaner.stop_word_count(), 2);
        assert_eq!(cleaner.clean("the").1, Classification::RejectedStopWord);
        assert_eq!(cleaner.clean("A.").1, Classification::RejectedStopWord);
        assert_eq!(cleaner.clean("an").1, Classification::Valid);
    }

    #[test]
    fn test_stop_words_from_reader() {
        let input = "the and\nof\n\n  to  \n";
        let cleaner = StandardCleaner::from_reader(input.as_bytes()).unwrap();
        assert_eq!(cleaner.stop_word_count(), 4);
        assert_eq!(cleaner.clean("Of").1, Classification::RejectedStopWord);
    }

    #[test]
    fn test_valid_words() {
        let cleaner = StandardCleaner::with_stop_words(["is"]);
        let words = cleaner.valid_words(" a b c c 100.00 is ");
        assert_eq!(words, vec!["a", "b", "c", "c"]);
        assert!(cleaner.valid_words("000").is_empty());
        assert!(cleaner.valid_words("").is_empty());
    }
}
