//! A production rule and its position arithmetic.
//!
//! The transition algorithm never looks at a rule's right-hand side
//! directly; it asks these position queries. All of them are pure: the same
//! `(rule, pos)` always yields the same answer.

use std::fmt;

use crate::rtn::token::GrammarToken;

/// One production: a left-hand-side symbol and an ordered right-hand-side
/// sequence of grammar tokens. Immutable once built.
pub struct Rule {
    lhs: GrammarToken,
    rhs: Vec<GrammarToken>,
}

impl Rule {
    /// The loader guarantees a symbol LHS and a non-empty RHS starting with
    /// a symbol; `new` only asserts the structural minimum.
    pub fn new(lhs: GrammarToken, rhs: Vec<GrammarToken>) -> Self {
        debug_assert!(!rhs.is_empty());
        Rule { lhs, rhs }
    }

    pub fn lhs(&self) -> &GrammarToken {
        &self.lhs
    }

    pub fn rhs(&self) -> &[GrammarToken] {
        &self.rhs
    }

    /// The RHS token at `pos`, or `None` past the end.
    pub fn rhs_at(&self, pos: usize) -> Option<&GrammarToken> {
        self.rhs.get(pos)
    }

    /// Whether the token at `pos` may be skipped, i.e. the following RHS
    /// entry is `?` or `*`. An `.` marker after a token marks a valid stop,
    /// not skippability.
    pub fn is_optional(&self, pos: usize) -> bool {
        matches!(
            self.rhs.get(pos + 1),
            Some(GrammarToken::Optional) | Some(GrammarToken::ZeroOrMore)
        )
    }

    /// The first non-marker position strictly after `pos`.
    pub fn next_token_position(&self, pos: usize) -> Option<usize> {
        let mut i = pos + 1;
        while let Some(token) = self.rhs.get(i) {
            if token.is_special() {
                i += 1;
            } else {
                return Some(i);
            }
        }
        None
    }

    /// The last non-marker position strictly before `pos`.
    pub fn prev_token_position(&self, pos: usize) -> Option<usize> {
        let mut i = pos.min(self.rhs.len());
        while i > 0 {
            i -= 1;
            if !self.rhs[i].is_special() {
                return Some(i);
            }
        }
        None
    }

    /// Whether a derivation sitting at `pos` may stop here: walking
    /// forward, an `.` marker means yes regardless of what follows, a
    /// repetition marker belongs to the already-consumed previous token,
    /// and a symbol blocks unless its own `?`/`*` marker makes it
    /// skippable.
    pub fn is_terminal(&self, pos: usize) -> bool {
        let mut i = pos;
        loop {
            match self.rhs.get(i) {
                None => return true,
                Some(GrammarToken::End) => return true,
                Some(GrammarToken::Optional)
                | Some(GrammarToken::ZeroOrMore)
                | Some(GrammarToken::OneOrMore) => i += 1,
                Some(GrammarToken::Symbol(_)) => match self.rhs.get(i + 1) {
                    Some(GrammarToken::Optional) | Some(GrammarToken::ZeroOrMore) => i += 2,
                    _ => return false,
                },
            }
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-", self.lhs.name())?;
        for token in &self.rhs {
            write!(f, " {}", token.name())?;
        }
        Ok(())
    }
}
