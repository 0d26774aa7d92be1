//! Opaque token allocation for one unit's protect/restore round.
//!
//! Keys look like `__PH3__`: a fixed `__` delimiter, a kind label and a counter shared
//! by every kind, so two keys allocated by the same [`Tokenizer`] never collide.

use std::fmt::{Display, Formatter};

/// What a token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A backslash escape such as `\n` or `\u00e9`.
    Escape,
    /// A child element of the unit, put back by the restorer rather than by `unprotect`.
    Element,
    /// A `<...>` found inside the unit's text.
    Markup,
    /// A printf-style placeholder (`%1$s`, `%d`, `%%`).
    Printf,
    /// A brace placeholder (`{0}`).
    Brace,
}

impl TokenKind {
    fn label(self) -> &'static str {
        match self {
            TokenKind::Escape => "ESC",
            TokenKind::Element | TokenKind::Markup => "TAG",
            TokenKind::Printf => "PH",
            TokenKind::Brace => "BR",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    pub key: String,
    pub kind: TokenKind,
    pub payload: String,
}

/// Ordered token-key → original substring table, scoped to one unit.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TokenMap {
    entries: Vec<TokenEntry>,
}

impl TokenMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&TokenEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Entries in allocation order.
    pub fn iter(&self) -> std::slice::Iter<'_, TokenEntry> {
        self.entries.iter()
    }

    pub fn count_of(&self, kind: TokenKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}

/// Allocates keys that do not occur in the unit's source text.
#[derive(Debug)]
pub struct Tokenizer {
    source: String,
    counter: usize,
    map: TokenMap,
}

impl Tokenizer {
    /// Creates a tokenizer for one unit; `source` is the text the keys must not clash with.
    pub fn new(source: impl Into<String>) -> Self {
        Self::starting_at(source, 0)
    }

    /// Like [`Tokenizer::new`], numbering keys from `first`.
    pub fn starting_at(source: impl Into<String>, first: usize) -> Self {
        Tokenizer {
            source: source.into(),
            counter: first,
            map: TokenMap::default(),
        }
    }

    /// The number the next key would get.
    pub fn next_index(&self) -> usize {
        self.counter
    }

    pub fn allocate(&mut self, kind: TokenKind, payload: impl Into<String>) -> String {
        let key = loop {
            let candidate = format!("__{}{}__", kind.label(), self.counter);
            self.counter += 1;
            if !self.source.contains(&candidate) {
                break candidate;
            }
        };
        self.map.entries.push(TokenEntry {
            key: key.clone(),
            kind,
            payload: payload.into(),
        });
        key
    }

    pub fn map(&self) -> &TokenMap {
        &self.map
    }

    pub fn into_map(self) -> TokenMap {
        self.map
    }
}
