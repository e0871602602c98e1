use std::collections::HashMap;
use std::io::Write;

/// Per-line word counts produced by a worker
pub type WordCounts = HashMap<String, u64>;

/// Width of the word column in the totals output
pub const WORD_COLUMN_WIDTH: usize = 27;

/// Running totals of word occurrences across all lines.
///
/// Merging is plain addition, so the final table does not depend on the
/// order in which workers hand their counts over.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WordTotals {
    totals: HashMap<String, u64>,
}

impl WordTotals {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one line's counts into the table
    pub fn merge(&mut self, counts: WordCounts) {
        for (word, count) in counts {
            *self.totals.entry(word).or_insert(0) += count;
        }
    }

    /// Total for a single word, if it was seen
    pub fn get(&self, word: &str) -> Option<u64> {
        self.totals.get(word).copied()
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Whether no word has been seen
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Entries sorted ascending by word
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self
            .totals
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Write the table sorted by word, one `word count` pair per line
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (word, count) in self.sorted() {
            writeln!(out, "{word:<width$} {count}", width = WORD_COLUMN_WIDTH)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> WordCounts {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn test_merge_is_commutative() {
        let first = counts(&[("a", 1)]);
        let second = counts(&[("a", 1), ("b", 2)]);

        let mut forward = WordTotals::new();
        forward.merge(first.clone());
        forward.merge(second.clone());

        let mut reverse = WordTotals::new();
        reverse.merge(second);
        reverse.merge(first);

        assert_eq!(forward, reverse);
        assert_eq!(forward.get("a"), Some(2));
        assert_eq!(forward.get("b"), Some(2));
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn test_sorted_output() {
        let mut totals = WordTotals::new();
        totals.merge(counts(&[("pear", 1), ("apple", 3), ("fig", 2)]));

        let mut out = Vec::new();
        totals.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("apple "));
        assert!(lines[1].starts_with("fig "));
        assert!(lines[2].starts_with("pear "));
        assert_eq!(lines[0].len(), WORD_COLUMN_WIDTH + 2);
        assert!(lines[0].ends_with(" 3"));
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        let totals = WordTotals::new();
        let mut out = Vec::new();
        totals.write_to(&mut out).unwrap();
        assert!(out.is_empty());
        assert!(totals.is_empty());
    }
}
