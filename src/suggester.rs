use std::collections::HashSet;
use tst::TSTMap;

/// Word-prefix lookup backing the type-ahead suggestions, indexed over hub
/// names and cities.
///
/// # Does
/// * Tokenizes keys on whitespace boundaries
/// * Ignores case
/// * Prefix-matches each word of the query, intersecting multi-word queries
///
/// # Should do
/// * Tokenize inside CJK names rather than indexing them whole
/// * Fold diacritics (São Paulo, Çanakkale)
pub struct Suggester<T> {
    map: TSTMap<HashSet<T>>,
}

impl<T: std::hash::Hash + Eq + Copy> Suggester<T> {
    pub fn new() -> Suggester<T> {
        Suggester {
            map: TSTMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, value: T) {
        for word in key.split_whitespace() {
            // two-letter noise words add nothing, but three bytes keeps
            // short city names and single CJK characters indexed
            if word.len() >= 3 {
                let v = self.map.entry(&word.to_lowercase()).or_insert(HashSet::new());
                v.insert(value);
            }
        }
    }

    pub fn num_words(&self) -> usize {
        self.map.len()
    }

    pub fn prefix_iter(&self, prefix: &str) -> impl Iterator<Item = (String, &HashSet<T>)> {
        self.map.prefix_iter(&prefix.to_lowercase())
    }

    pub fn search(&self, query: &str) -> impl IntoIterator<Item = T> {
        let query: Vec<_> = query.split_whitespace().collect();
        let mut results: HashSet<T> = match query.first() {
            Some(word) => self.prefix_iter(word).map(|(_, s)| s).flatten().map(|i| *i).collect(),
            None => HashSet::new(),
        };
        for part in &query[1..] {
            let previous_results = results;
            results = self.prefix_iter(&part).map(|(_, s)| s).flatten().map(|i| *i).filter(|val| previous_results.contains(val)).collect();
        }
        results
    }
}
