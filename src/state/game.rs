use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier of a player as supplied by the chat transport.
pub type PlayerId = i64;

/// Identifier of a single live session, used to tell a session apart from its successors.
pub type SessionId = Uuid;

/// One symbol of the alphabet (an emoji in the default configuration).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Wrap a raw symbol value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw symbol value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Fixed, ordered set of distinct symbols sequences are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<Symbol>,
}

impl Alphabet {
    /// Build an alphabet, dropping repeated symbols while keeping the first occurrence order.
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut unique: Vec<Symbol> = Vec::new();
        for symbol in symbols {
            if !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }
        Self { symbols: unique }
    }

    /// Number of distinct symbols, which also bounds the length of any sequence.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the alphabet holds no symbol at all.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in their configured order (the order choices are presented in).
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Whether `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new(
            ["🔴", "🔵", "🟢", "🟡", "🟣", "🟠", "⚫", "⚪"]
                .into_iter()
                .map(Symbol::from),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alphabet_has_eight_distinct_symbols() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.len(), 8);
        assert!(alphabet.contains(&Symbol::from("🟣")));
    }

    #[test]
    fn duplicates_are_dropped() {
        let alphabet = Alphabet::new(["a", "b", "a", "c"].into_iter().map(Symbol::from));
        let raw: Vec<&str> = alphabet.symbols().iter().map(Symbol::as_str).collect();
        assert_eq!(raw, vec!["a", "b", "c"]);
    }
}
