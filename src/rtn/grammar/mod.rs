//! Grammar ownership, rule indexing, and derivation-path search.
//!
//!     A grammar owns its rules and an index from common keys to the rule
//!     positions reachable under that key. The index is built once, at load
//!     time: for every rule we walk forward from RHS position 0 across
//!     leading optional positions, registering the rule under every common
//!     key encountered, so a rule whose first token is optional is still
//!     found when that token is absent from the input.
//!
//!     On top of the index sits the derivation-path search: chains of rule
//!     substitutions linking a starting symbol to a rule whose first RHS
//!     token matches the input directly. Push-state construction consumes
//!     these paths; nothing else does.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::rtn::decode::{DefaultDecoder, StateDecoder};
use crate::rtn::state::State;
use crate::rtn::token::{GrammarToken, Token, TokenFactory};

mod loader;
mod rule;

pub use loader::GrammarError;
pub use rule::Rule;

/// A rule position reachable under a lookup key. Internal bookkeeping only:
/// leading optional tokens make more than one starting position reachable
/// for the same rule.
#[derive(Clone)]
pub(crate) struct RulePos {
    pub(crate) pos: usize,
    pub(crate) key: Option<String>,
    pub(crate) rule: Arc<Rule>,
}

impl fmt::Debug for RulePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RulePos[pos={},key={:?},rule={:?}]",
            self.pos, self.key, self.rule
        )
    }
}

/// An ordered chain of rule positions describing a derivation: the first
/// entry's LHS is the outermost symbol, each later entry's LHS is matched
/// by the first RHS token of the entry before it, and the final entry's
/// first RHS token matches the target input token.
#[derive(Clone, Debug)]
pub(crate) struct RulePath {
    path: Vec<RulePos>,
}

impl RulePath {
    fn new(final_rule: RulePos) -> Self {
        RulePath {
            path: vec![final_rule],
        }
    }

    fn with_head(&self, head: RulePos) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(head);
        path.extend(self.path.iter().cloned());
        RulePath { path }
    }

    fn lhs(&self) -> &GrammarToken {
        self.path[0].rule.lhs()
    }

    fn contains_rule(&self, rule: &Arc<Rule>) -> bool {
        self.path.iter().any(|rp| Arc::ptr_eq(&rp.rule, rule))
    }

    pub(crate) fn len(&self) -> usize {
        self.path.len()
    }

    /// The chain from `start` (outermost first).
    pub(crate) fn suffix(&self, start: usize) -> &[RulePos] {
        &self.path[start..]
    }
}

struct GrammarCore {
    token2rules: HashMap<String, Vec<RulePos>>,
    guessable_rules: Vec<RulePos>,
    rules: Vec<Arc<Rule>>,
    decoder: Box<dyn StateDecoder>,
}

/// A grammar expressed as a pattern of tokens.
///
/// Rules have the form `lhs <- rhs`, where the LHS symbol can be
/// substituted for the RHS sequence. Reserved RHS literals: `x +` repeats
/// `x` one or more times, `x *` zero or more times, `x ?` makes `x`
/// optional, and `.` marks a position where the rule is a valid end.
///
/// Cheap to clone; all clones share the same immutable core.
#[derive(Clone)]
pub struct Grammar {
    core: Arc<GrammarCore>,
}

impl Grammar {
    /// Build a grammar from already-resolved rules with the default
    /// decoder.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_decoder(rules, Box::new(DefaultDecoder))
    }

    /// Build a grammar from already-resolved rules and a decoder used by
    /// [State::build_tree](crate::rtn::State::build_tree).
    pub fn with_decoder(rules: Vec<Rule>, decoder: Box<dyn StateDecoder>) -> Self {
        let rules: Vec<Arc<Rule>> = rules.into_iter().map(Arc::new).collect();
        let mut token2rules: HashMap<String, Vec<RulePos>> = HashMap::new();
        let mut guessable_rules = Vec::new();

        for rule in &rules {
            let mut position = Some(0);
            while let Some(pos) = position {
                let Some(token) = rule.rhs_at(pos) else { break };
                map_keys(&mut token2rules, &mut guessable_rules, token, rule, pos);
                if rule.is_optional(pos) {
                    position = rule.next_token_position(pos);
                } else {
                    break;
                }
            }
        }

        Grammar {
            core: Arc::new(GrammarCore {
                token2rules,
                guessable_rules,
                rules,
                decoder,
            }),
        }
    }

    /// Parse a whole grammar text (one rule per line; `#` lines and blank
    /// lines ignored) with the default decoder.
    pub fn load(text: &str, factory: &dyn TokenFactory) -> Result<Self, GrammarError> {
        Ok(Self::new(loader::parse_rules(text.lines(), factory)?))
    }

    /// Parse a grammar from individual rule lines.
    pub fn load_lines(lines: &[&str], factory: &dyn TokenFactory) -> Result<Self, GrammarError> {
        Ok(Self::new(loader::parse_rules(
            lines.iter().copied(),
            factory,
        )?))
    }

    /// Parse a grammar text with an explicit decoder.
    pub fn load_with_decoder(
        text: &str,
        factory: &dyn TokenFactory,
        decoder: Box<dyn StateDecoder>,
    ) -> Result<Self, GrammarError> {
        Ok(Self::with_decoder(
            loader::parse_rules(text.lines(), factory)?,
            decoder,
        ))
    }

    /// Load a grammar from a file.
    pub fn load_file(
        path: impl AsRef<Path>,
        factory: &dyn TokenFactory,
    ) -> Result<Self, GrammarError> {
        let text = std::fs::read_to_string(path).map_err(GrammarError::Io)?;
        Self::load(&text, factory)
    }

    /// The initial state for driving this grammar over an input stream.
    pub fn first_state(&self) -> State {
        State::initial(self.clone())
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.core.rules.iter().map(|r| r.as_ref())
    }

    pub(crate) fn decoder(&self) -> &dyn StateDecoder {
        self.core.decoder.as_ref()
    }

    /// All indexed rule positions reachable under any of the given keys;
    /// `None` keys (an unkeyed token) fall back to the guessable set.
    fn find_rules_for_keys(&self, keys: Option<&[String]>) -> Option<Vec<RulePos>> {
        match keys {
            Some(keys) => {
                let mut result: Option<Vec<RulePos>> = None;
                for key in keys {
                    if let Some(rules) = self.core.token2rules.get(key) {
                        result
                            .get_or_insert_with(Vec::new)
                            .extend(rules.iter().cloned());
                    }
                }
                result
            }
            None => {
                if self.core.guessable_rules.is_empty() {
                    None
                } else {
                    Some(self.core.guessable_rules.clone())
                }
            }
        }
    }

    pub(crate) fn find_rules_for_token(&self, token: &Token) -> Option<Vec<RulePos>> {
        self.find_rules_for_keys(token.common_keys())
    }

    fn find_rules_for_symbol(&self, symbol: &GrammarToken) -> Option<Vec<RulePos>> {
        self.find_rules_for_keys(symbol.common_keys())
    }

    /// Every chain of rule substitutions whose final step's first RHS token
    /// matches `to_token` and whose outermost LHS equals `from` (or is
    /// unconstrained when `from` is `None`).
    pub(crate) fn find_paths(
        &self,
        from: Option<&GrammarToken>,
        to_token: &Token,
    ) -> Option<Vec<RulePath>> {
        let applicable = self.find_rules_for_token(to_token)?;
        let mut result: Option<Vec<RulePath>> = None;
        for rule_pos in applicable {
            if let Some(paths) = self.follow_paths(from, RulePath::new(rule_pos)) {
                result.get_or_insert_with(Vec::new).extend(paths);
            }
        }
        result
    }

    fn follow_paths(
        &self,
        stop_at: Option<&GrammarToken>,
        rule_path: RulePath,
    ) -> Option<Vec<RulePath>> {
        if let Some(stop) = stop_at {
            if rule_path.lhs() == stop {
                return Some(vec![rule_path]);
            }
        }
        let Some(head_rules) = self.find_rules_for_symbol(rule_path.lhs()) else {
            // Dead end: with no target constraint the maximal path itself
            // is the answer; with one, the target was never reached.
            return if stop_at.is_none() {
                Some(vec![rule_path])
            } else {
                None
            };
        };

        let mut result: Option<Vec<RulePath>> = None;
        let mut followed_any = false;
        for head in head_rules {
            // Visited-rule guard: a unit-substitution cycle would otherwise
            // recurse forever.
            if rule_path.contains_rule(&head.rule) {
                continue;
            }
            followed_any = true;
            if let Some(paths) = self.follow_paths(stop_at, rule_path.with_head(head)) {
                result.get_or_insert_with(Vec::new).extend(paths);
            }
        }
        if !followed_any && stop_at.is_none() {
            // All extensions were cyclic; the path is maximal as it stands.
            return Some(vec![rule_path]);
        }
        result
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("rules", &self.core.rules)
            .finish()
    }
}

fn map_keys(
    token2rules: &mut HashMap<String, Vec<RulePos>>,
    guessable_rules: &mut Vec<RulePos>,
    token: &GrammarToken,
    rule: &Arc<Rule>,
    pos: usize,
) {
    if let Some(keys) = token.common_keys() {
        for key in keys {
            token2rules
                .entry(key.clone())
                .or_default()
                .push(RulePos {
                    pos,
                    key: Some(key.clone()),
                    rule: Arc::clone(rule),
                });
        }
    }
    if token.is_guessable() {
        guessable_rules.push(RulePos {
            pos,
            key: None,
            rule: Arc::clone(rule),
        });
    }
}
