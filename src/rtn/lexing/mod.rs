//! A thin tokenization adapter for driving the engine from text.
//!
//! The real NLP tokenizer/normalizer pipeline lives outside this crate;
//! what's here is the minimum to turn a whitespace-separated line into
//! input tokens, optionally looking surface strings up in a [Lexicon] so
//! they carry category keys instead of their own text. Tokenization itself
//! is handled entirely by logos.

use std::collections::HashMap;

use logos::Logos;

use crate::rtn::token::Token;

/// Raw symbols of a token line: maximal runs of non-whitespace.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\r\n]+")]
enum RawSymbol {
    #[regex(r"\S+")]
    Symbol,
}

/// Surface string to category keys. Words absent from the lexicon come out
/// unkeyed, which routes them to the grammar's guessable rules.
#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    entries: HashMap<String, Vec<String>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach categories to a surface string. Categories are canonicalized
    /// to upper case to match [CategoryRegistry](crate::rtn::CategoryRegistry).
    pub fn define(&mut self, word: &str, categories: &[&str]) {
        self.entries.insert(
            word.to_string(),
            categories.iter().map(|c| c.to_ascii_uppercase()).collect(),
        );
    }

    pub fn keys_for(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(|keys| keys.as_slice())
    }
}

/// Split a line into plain symbol tokens (each keyed by its own text).
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut lexer = RawSymbol::lexer(line);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        if result.is_ok() {
            tokens.push(Token::symbol(lexer.slice()));
        }
    }
    tokens
}

/// Split a line into tokens keyed through the lexicon; unknown words come
/// out unkeyed.
pub fn tokenize_with(line: &str, lexicon: &Lexicon) -> Vec<Token> {
    let mut lexer = RawSymbol::lexer(line);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        if result.is_ok() {
            let word = lexer.slice();
            match lexicon.keys_for(word) {
                Some(keys) => tokens.push(Token::with_keys(word, keys.to_vec())),
                None => tokens.push(Token::unkeyed(word)),
            }
        }
    }
    tokens
}
