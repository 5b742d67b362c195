//! Category-based token resolution.
//!
//! Grammars over natural-language input rarely match surface strings; they
//! match lexical categories a tokenizer has attached to each token. This
//! factory resolves rule-text names against a registry of declared
//! categories, so `np <- det noun` matches any token carrying the `DET` or
//! `NOUN` key. A `?` prefix on a rule-text name (e.g. `?noun`) marks the
//! symbol guessable: rules starting with it are tried for tokens carrying
//! no keys at all. A category may also be declared guessable globally.

use std::collections::HashMap;
use std::sync::Arc;

use crate::rtn::grammar::GrammarError;
use crate::rtn::token::{marker_for, GrammarToken, Token, TokenFactory, TokenMatcher};

/// The set of declared categories. Names are canonicalized to upper case,
/// so `noun`, `Noun`, and `NOUN` all resolve to the same category.
#[derive(Debug, Default, Clone)]
pub struct CategoryRegistry {
    categories: HashMap<String, bool>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a category; `can_guess` marks every symbol of this category
    /// guessable.
    pub fn define(&mut self, name: &str, can_guess: bool) {
        self.categories
            .insert(name.to_ascii_uppercase(), can_guess);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.categories.contains_key(&name.to_ascii_uppercase())
    }

    fn can_guess(&self, canonical: &str) -> Option<bool> {
        self.categories.get(canonical).copied()
    }
}

#[derive(Debug)]
struct CategoryMatcher {
    category: String,
    keys: Vec<String>,
    guessable: bool,
}

impl TokenMatcher for CategoryMatcher {
    fn name(&self) -> &str {
        &self.category
    }

    fn common_keys(&self) -> &[String] {
        &self.keys
    }

    fn is_guessable(&self) -> bool {
        self.guessable
    }

    fn matches(&self, token: &Token) -> bool {
        token.keys().iter().any(|k| k == &self.category)
    }
}

/// Resolves rule-text names to category symbols.
#[derive(Debug, Clone)]
pub struct CategoryTokenFactory {
    registry: CategoryRegistry,
}

impl CategoryTokenFactory {
    pub fn new(registry: CategoryRegistry) -> Self {
        CategoryTokenFactory { registry }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }
}

impl TokenFactory for CategoryTokenFactory {
    fn grammar_token(&self, text: &str) -> Result<GrammarToken, GrammarError> {
        if let Some(marker) = marker_for(text) {
            return Ok(marker);
        }
        let (name, prefixed_guessable) = match text.strip_prefix('?') {
            Some(rest) => (rest, true),
            None => (text, false),
        };
        let canonical = name.to_ascii_uppercase();
        let Some(can_guess) = self.registry.can_guess(&canonical) else {
            return Err(GrammarError::UnknownCategory {
                token: text.to_string(),
            });
        };
        Ok(GrammarToken::Symbol(Arc::new(CategoryMatcher {
            keys: vec![canonical.clone()],
            category: canonical,
            guessable: prefixed_guessable || can_guess,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> CategoryTokenFactory {
        let mut registry = CategoryRegistry::new();
        registry.define("NOUN", false);
        registry.define("VERB", true);
        CategoryTokenFactory::new(registry)
    }

    #[test]
    fn test_case_insensitive_resolution() {
        let factory = factory();
        for spelling in ["noun", "Noun", "NOUN"] {
            let symbol = factory.grammar_token(spelling).unwrap();
            assert_eq!(symbol.name(), "NOUN");
            assert!(!symbol.is_guessable());
        }
    }

    #[test]
    fn test_guessable_prefix() {
        let factory = factory();
        let symbol = factory.grammar_token("?noun").unwrap();
        assert_eq!(symbol.name(), "NOUN");
        assert!(symbol.is_guessable());
    }

    #[test]
    fn test_guessable_category() {
        let factory = factory();
        assert!(factory.grammar_token("verb").unwrap().is_guessable());
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let factory = factory();
        assert!(matches!(
            factory.grammar_token("adjective"),
            Err(GrammarError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_matches_by_category_key() {
        let factory = factory();
        let symbol = factory.grammar_token("noun").unwrap();
        assert!(symbol.matches(&Token::with_keys("dog", vec!["NOUN".to_string()])));
        assert!(!symbol.matches(&Token::symbol("dog")));
    }
}
