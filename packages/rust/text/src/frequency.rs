//! Word-frequency aggregation across token sequences.

use std::collections::BTreeMap;

use crate::normalize::TokenSequence;

/// Word → occurrence count. Every stored count is at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold any number of sequences into one table.
    pub fn from_sequences<'a, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a TokenSequence>,
    {
        let mut table = Self::new();
        for sequence in sequences {
            table.add_sequence(sequence);
        }
        table
    }

    /// Count every token of `sequence`.
    pub fn add_sequence(&mut self, sequence: &TokenSequence) {
        for word in sequence.iter() {
            self.add(word, 1);
        }
    }

    /// Add the counts of `other` into this table.
    pub fn merge(&mut self, other: &FrequencyTable) {
        for (word, count) in other.iter() {
            self.add(word, count);
        }
    }

    fn add(&mut self, word: &str, count: u64) {
        if count == 0 {
            return;
        }
        match self.counts.get_mut(word) {
            Some(existing) => *existing = existing.saturating_add(count),
            None => {
                self.counts.insert(word.to_string(), count);
            }
        }
    }

    /// Count for `word`, or 0 when absent.
    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    /// Entries in word order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(w, c)| (w.as_str(), *c))
    }

    /// The `n` most frequent words, ties broken alphabetically.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn seq(words: &[&str]) -> TokenSequence {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn zero_sequences_give_empty_table() {
        let table = FrequencyTable::from_sequences(std::iter::empty());
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn counts_across_own_site_and_competitor() {
        let own = normalize("Fast shipping and great prices");
        let competitor = normalize("Great prices every day");
        let table = FrequencyTable::from_sequences([&own, &competitor]);

        assert_eq!(table.get("great"), 2);
        assert_eq!(table.get("prices"), 2);
        assert_eq!(table.get("shipping"), 1);
        assert_eq!(table.get("fast"), 1);
        assert_eq!(table.get("every"), 1);
        assert_eq!(table.get("day"), 1);
        assert_eq!(table.get("and"), 0);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn counts_equal_sum_of_occurrences() {
        let sequences = [
            seq(&["alpha", "beta", "alpha"]),
            seq(&["beta", "gamma"]),
            seq(&[]),
            seq(&["alpha"]),
        ];
        let table = FrequencyTable::from_sequences(&sequences);

        for word in ["alpha", "beta", "gamma"] {
            let expected: u64 = sequences
                .iter()
                .map(|s| s.iter().filter(|w| *w == word).count() as u64)
                .sum();
            assert_eq!(table.get(word), expected, "count for {word}");
        }
        assert_eq!(table.total(), 6);
        assert!(table.iter().all(|(_, c)| c > 0));
    }

    #[test]
    fn order_of_sequences_does_not_matter() {
        let a = seq(&["one", "two", "two"]);
        let b = seq(&["three", "two"]);
        let c = seq(&["one"]);

        let forward = FrequencyTable::from_sequences([&a, &b, &c]);
        let backward = FrequencyTable::from_sequences([&c, &b, &a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn merge_is_additive() {
        let a = seq(&["shipping", "prices"]);
        let b = seq(&["prices", "returns"]);

        let mut merged = FrequencyTable::from_sequences([&a]);
        merged.merge(&FrequencyTable::from_sequences([&b]));

        assert_eq!(merged, FrequencyTable::from_sequences([&a, &b]));
    }

    #[test]
    fn large_duplicate_counts() {
        let words: TokenSequence = std::iter::repeat_n("repeat".to_string(), 100_000).collect();
        let table = FrequencyTable::from_sequences([&words, &words]);
        assert_eq!(table.get("repeat"), 200_000);
    }

    #[test]
    fn top_orders_by_count_then_word() {
        let table = FrequencyTable::from_sequences([&seq(&[
            "pear", "apple", "pear", "fig", "apple", "kiwi", "pear",
        ])]);
        assert_eq!(
            table.top(3),
            vec![("pear", 3), ("apple", 2), ("fig", 1)]
        );
        assert_eq!(table.top(10).len(), 4);
    }
}
