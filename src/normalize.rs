use std::collections::HashMap;

use serde::Deserialize;

/// Exact-match rename lookup, old name -> canonical name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RenameTable(HashMap<String, String>);

impl RenameTable {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empty names pass through untouched; unknown names map to themselves.
    pub fn apply<'a>(&'a self, name: &'a str) -> &'a str {
        if name.is_empty() {
            return name;
        }
        self.0.get(name).map(String::as_str).unwrap_or(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Normalizer {
    #[serde(default)]
    pub commanders: RenameTable,
    #[serde(default)]
    pub cards: RenameTable,
}

impl Normalizer {
    pub fn new(commanders: RenameTable, cards: RenameTable) -> Self {
        Self { commanders, cards }
    }

    pub fn commander(&self, name: &str) -> String {
        self.commanders.apply(name).to_string()
    }

    pub fn card(&self, name: &str) -> String {
        self.cards.apply(name).to_string()
    }
}
