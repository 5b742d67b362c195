//! Token types shared between the grammar and the input side of the engine.
//!
//!     Two kinds of tokens meet in this crate. Input tokens are what a
//!     tokenizer hands to the state lattice: a surface string plus the set
//!     of "common keys" (caller-defined equivalence classes, e.g. lexical
//!     categories) under which grammar rules are indexed. Grammar tokens
//!     are the symbols appearing in rule right-hand sides; they are either
//!     terminal-matching symbols or one of the four reserved markers.
//!
//! Markers
//!
//!     The reserved rule-text literals and their meaning:
//!
//!         - `?`: the preceding token is optional
//!         - `*`: the preceding token repeats zero or more times
//!         - `+`: the preceding token repeats one or more times
//!         - `.`: the rule may be considered complete at this position
//!
//!     Markers never match input directly; they alter position skipping,
//!     repetition, and rule-completion checks in [Rule](crate::rtn::Rule)
//!     and [State](crate::rtn::State).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rtn::grammar::GrammarError;

mod category;

pub use category::{CategoryRegistry, CategoryTokenFactory};

/// An input token fed to the engine.
///
/// Carries the surface text and the common keys used for rule lookup. A
/// token with no keys is "unkeyed": rule lookup for it falls back to the
/// grammar's guessable rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    text: String,
    keys: Vec<String>,
}

impl Token {
    /// A plain symbol token whose only key is its own text.
    pub fn symbol(text: impl Into<String>) -> Self {
        let text = text.into();
        let keys = vec![text.clone()];
        Token { text, keys }
    }

    /// A token keyed by caller-defined equivalence classes (e.g. lexical
    /// categories).
    pub fn with_keys(text: impl Into<String>, keys: Vec<String>) -> Self {
        Token {
            text: text.into(),
            keys,
        }
    }

    /// A token with no common keys; rule lookup uses the guessable
    /// fallback set for it.
    pub fn unkeyed(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            keys: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The keys under which rules should be looked up, or `None` for an
    /// unkeyed token.
    pub fn common_keys(&self) -> Option<&[String]> {
        if self.keys.is_empty() {
            None
        } else {
            Some(&self.keys)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// The caller-supplied matching capability behind a terminal grammar symbol.
///
/// Implementations decide what "this grammar symbol matches that input
/// token" means; the engine only ever asks through this trait.
pub trait TokenMatcher: fmt::Debug + Send + Sync {
    /// The symbol's display name; also its identity for rule-path search.
    fn name(&self) -> &str;

    /// The keys under which rules starting with this symbol are indexed.
    fn common_keys(&self) -> &[String];

    /// Whether rules starting with this symbol may be tried for unkeyed
    /// input tokens.
    fn is_guessable(&self) -> bool {
        false
    }

    fn matches(&self, token: &Token) -> bool;
}

/// A grammar (rule) token: a terminal-matching symbol or a reserved marker.
#[derive(Clone)]
pub enum GrammarToken {
    /// A symbol wrapping a caller-supplied matcher.
    Symbol(Arc<dyn TokenMatcher>),
    /// `?` — the preceding token is optional.
    Optional,
    /// `*` — the preceding token repeats zero or more times.
    ZeroOrMore,
    /// `+` — the preceding token repeats one or more times.
    OneOrMore,
    /// `.` — the rule may be considered complete here.
    End,
}

impl GrammarToken {
    pub fn is_special(&self) -> bool {
        !matches!(self, GrammarToken::Symbol(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, GrammarToken::Symbol(_))
    }

    /// The symbol name, or the reserved literal for markers.
    pub fn name(&self) -> &str {
        match self {
            GrammarToken::Symbol(matcher) => matcher.name(),
            GrammarToken::Optional => "?",
            GrammarToken::ZeroOrMore => "*",
            GrammarToken::OneOrMore => "+",
            GrammarToken::End => ".",
        }
    }

    /// Whether this grammar token matches the given input token. Markers
    /// never match input.
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            GrammarToken::Symbol(matcher) => matcher.matches(token),
            _ => false,
        }
    }

    /// The keys this token is indexed under, or `None` for markers.
    pub fn common_keys(&self) -> Option<&[String]> {
        match self {
            GrammarToken::Symbol(matcher) => Some(matcher.common_keys()),
            _ => None,
        }
    }

    pub fn is_guessable(&self) -> bool {
        match self {
            GrammarToken::Symbol(matcher) => matcher.is_guessable(),
            _ => false,
        }
    }
}

impl PartialEq for GrammarToken {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GrammarToken::Symbol(a), GrammarToken::Symbol(b)) => a.name() == b.name(),
            (GrammarToken::Optional, GrammarToken::Optional) => true,
            (GrammarToken::ZeroOrMore, GrammarToken::ZeroOrMore) => true,
            (GrammarToken::OneOrMore, GrammarToken::OneOrMore) => true,
            (GrammarToken::End, GrammarToken::End) => true,
            _ => false,
        }
    }
}

impl Eq for GrammarToken {}

impl fmt::Debug for GrammarToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for GrammarToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolves rule-text tokens to [GrammarToken]s, decoupling the textual
/// grammar format from the concrete terminal-matching logic.
pub trait TokenFactory {
    fn grammar_token(&self, text: &str) -> Result<GrammarToken, GrammarError>;
}

/// Maps a reserved literal to its marker, or `None` for ordinary symbols.
pub(crate) fn marker_for(text: &str) -> Option<GrammarToken> {
    match text {
        "?" => Some(GrammarToken::Optional),
        "*" => Some(GrammarToken::ZeroOrMore),
        "+" => Some(GrammarToken::OneOrMore),
        "." => Some(GrammarToken::End),
        _ => None,
    }
}

/// A symbol matched by its literal name.
#[derive(Debug)]
struct LiteralMatcher {
    name: String,
    keys: Vec<String>,
}

impl TokenMatcher for LiteralMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn common_keys(&self) -> &[String] {
        &self.keys
    }

    fn matches(&self, token: &Token) -> bool {
        token.keys().iter().any(|k| k == &self.name) || token.text() == self.name
    }
}

/// The default factory: reserved literals become markers, everything else
/// becomes a literal symbol keyed by its own name.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralTokenFactory;

impl TokenFactory for LiteralTokenFactory {
    fn grammar_token(&self, text: &str) -> Result<GrammarToken, GrammarError> {
        if let Some(marker) = marker_for(text) {
            return Ok(marker);
        }
        Ok(GrammarToken::Symbol(Arc::new(LiteralMatcher {
            name: text.to_string(),
            keys: vec![text.to_string()],
        })))
    }
}
