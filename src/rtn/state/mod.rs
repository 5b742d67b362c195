//! The state lattice and the transition algorithm.
//!
//!     A state encodes derivation progress: the rule being matched, the
//!     position within its RHS, the input token that was consumed entering
//!     the state, a link to the previous state at the same push depth, and
//!     a link to the enclosing state whose nonterminal this rule was pushed
//!     to satisfy. States form a persistent lattice: once a state has been
//!     handed out it is never mutated, so the branches returned from one
//!     transition can be explored independently (and in parallel) without
//!     interfering with each other.
//!
//!     Transitions are total: an input token that fits nowhere produces an
//!     empty successor set, never an error. Ambiguity produces several
//!     successors from one call.
//!
//! Push, pop, repeat
//!
//!     Entering a sub-rule to satisfy a nonterminal is a push; the pushed
//!     chain's parent snapshot is advanced past the nonterminal position at
//!     push time, so popping needs no position bookkeeping. A pop resumes
//!     the parent as a fresh node that records the completed child; the
//!     untouched ancestor tail is shared structurally, which is what makes
//!     sibling branches safe without any defensive copying. Repetition
//!     markers invite both a backward re-match of the previous grammar
//!     token and a repeated push of the same nonterminal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::rtn::decode::{ParseTree, StateDecoder};
use crate::rtn::grammar::{Grammar, Rule, RulePos};
use crate::rtn::token::{GrammarToken, Token};

struct StateNode {
    grammar: Grammar,
    rule: Option<Arc<Rule>>,
    cur_pos: usize,
    token: Option<Token>,
    prev: Option<State>,
    parent: Option<State>,
    last_child: Option<State>,
}

/// A node in the derivation lattice. Cheap to clone; clones share the same
/// immutable node.
#[derive(Clone)]
pub struct State {
    node: Arc<StateNode>,
}

impl State {
    /// The synthetic initial state. Created by
    /// [Grammar::first_state](crate::rtn::Grammar::first_state).
    pub(crate) fn initial(grammar: Grammar) -> State {
        State {
            node: Arc::new(StateNode {
                grammar,
                rule: None,
                cur_pos: 0,
                token: None,
                prev: None,
                parent: None,
                last_child: None,
            }),
        }
    }

    /// A state entering `rule_pos`'s rule. The position is incremented at
    /// push time, not at pop time.
    fn push(
        grammar: Grammar,
        rule_pos: &RulePos,
        parent: Option<State>,
        token: Option<Token>,
    ) -> State {
        State {
            node: Arc::new(StateNode {
                grammar,
                rule: Some(Arc::clone(&rule_pos.rule)),
                cur_pos: rule_pos.pos + 1,
                token,
                prev: None,
                parent,
                last_child: None,
            }),
        }
    }

    /// A successor at the same push depth: same rule, new position, this
    /// state as the consumption history.
    fn advanced(&self, token: Option<Token>, new_pos: usize) -> State {
        State {
            node: Arc::new(StateNode {
                grammar: self.node.grammar.clone(),
                rule: self.node.rule.clone(),
                cur_pos: new_pos,
                token,
                prev: Some(self.clone()),
                parent: self.node.parent.clone(),
                last_child: None,
            }),
        }
    }

    /// The pop-time view of a parent: identical except that it records the
    /// completed child. The ancestor tail is shared, not copied.
    fn with_last_child(&self, child: State) -> State {
        State {
            node: Arc::new(StateNode {
                grammar: self.node.grammar.clone(),
                rule: self.node.rule.clone(),
                cur_pos: self.node.cur_pos,
                token: self.node.token.clone(),
                prev: self.node.prev.clone(),
                parent: self.node.parent.clone(),
                last_child: Some(child),
            }),
        }
    }

    /// The next state(s) reached by transitioning over `token`. Empty means
    /// the token is not accepted from this state.
    pub fn next_states(&self, token: &Token) -> Vec<State> {
        if self.node.rule.is_none() {
            // At the first state: find applicable rules through the grammar.
            return self.deep_push_states(token);
        }

        let mut result = Vec::new();

        // Positional advances within the current rule.
        if let Some(positions) = self.compute_next_positions(token) {
            for pos in positions {
                result.push(self.advanced(Some(token.clone()), pos));
            }
        }

        // Repeat pushes: rule substitutions invited by a repetition marker.
        let mut did_push = false;
        if let Some(special) = self.special_substitution_token() {
            if !matches!(special, GrammarToken::Optional) {
                if let Some(filter) = self.prev_grammar_token() {
                    let pushes = self.next_push_states(token, Some(&filter));
                    if !pushes.is_empty() {
                        result.extend(pushes);
                        did_push = true;
                    }
                }
            }
        }

        // Pops: resume the enclosing rule with the same input token.
        if self.at_end_of_rule() {
            result.extend(self.next_pop_states(token));
        }

        // New pushes: plausible substitutions for the active nonterminal.
        if !did_push {
            if let Some(cur) = self.grammar_token() {
                let push_from = if cur.is_special() {
                    // The substitution belongs at the next real position.
                    self.rule()
                        .and_then(|r| r.next_token_position(self.node.cur_pos))
                        .map(|pos| self.advanced(None, pos))
                } else {
                    Some(self.clone())
                };
                if let Some(from) = push_from {
                    result.extend(from.next_push_states(token, None));
                }
            }
        }

        result
    }

    /// Whether this state is (or can be) a valid exit: the rule is at a
    /// terminal position and so, recursively, is every enclosing rule.
    /// Being terminal does not prevent a state from having next states.
    pub fn is_terminal(&self) -> bool {
        self.at_end_of_rule()
            && self
                .parent_state()
                .map_or(true, |parent| parent.is_terminal())
    }

    /// Build the parse tree leading to this state with the grammar's
    /// decoder.
    pub fn build_tree(&self) -> Option<ParseTree> {
        self.node.grammar.decoder().decode(self)
    }

    /// Build the parse tree leading to this state with the given decoder.
    pub fn build_tree_with(&self, decoder: &dyn StateDecoder) -> Option<ParseTree> {
        decoder.decode(self)
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.node.rule.as_deref()
    }

    /// The state that led to this one at the same push depth.
    pub fn prev_state(&self) -> Option<State> {
        self.node.prev.clone()
    }

    /// The enclosing state this rule invocation was pushed from.
    pub fn parent_state(&self) -> Option<State> {
        self.node.parent.clone()
    }

    /// The completed child invocation recorded at pop time.
    pub fn last_child_state(&self) -> Option<State> {
        self.node.last_child.clone()
    }

    /// The input token consumed entering this state.
    pub fn input_token(&self) -> Option<&Token> {
        self.node.token.as_ref()
    }

    /// The grammar token the consumed input matched.
    pub fn matched_grammar_token(&self) -> Option<GrammarToken> {
        self.prev_grammar_token()
    }

    /// The RHS position being considered at this state.
    pub fn token_pos(&self) -> usize {
        self.node.cur_pos
    }

    /// How far along the current rule invocation this state is.
    pub fn chain_pos(&self) -> usize {
        let mut result = 0;
        let mut cur = self.node.prev.clone();
        while let Some(state) = cur {
            result += 1;
            cur = state.node.prev.clone();
        }
        result
    }

    /// Push depth: the number of enclosing rule invocations.
    pub fn depth(&self) -> usize {
        let mut result = 0;
        let mut cur = self.node.parent.clone();
        while let Some(state) = cur {
            result += 1;
            cur = state.node.parent.clone();
        }
        result
    }

    fn grammar_token(&self) -> Option<GrammarToken> {
        self.rule().and_then(|r| r.rhs_at(self.node.cur_pos)).cloned()
    }

    fn prev_grammar_token(&self) -> Option<GrammarToken> {
        let rule = self.rule()?;
        let pos = rule.prev_token_position(self.node.cur_pos)?;
        rule.rhs_at(pos).cloned()
    }

    /// The repetition marker at the current position, if any. `.` is an end
    /// marker, not a substitution site.
    fn special_substitution_token(&self) -> Option<GrammarToken> {
        match self.grammar_token() {
            Some(token) if token.is_special() && !matches!(token, GrammarToken::End) => {
                Some(token)
            }
            _ => None,
        }
    }

    fn at_end_of_rule(&self) -> bool {
        let Some(rule) = self.rule() else {
            return false;
        };
        if rule.rhs_at(self.node.cur_pos).is_none() {
            return true;
        }
        rule.is_terminal(self.node.cur_pos)
    }

    /// All RHS positions the input can advance to from the current one.
    fn compute_next_positions(&self, token: &Token) -> Option<Vec<usize>> {
        let rule = self.rule()?;
        let cur = rule.rhs_at(self.node.cur_pos)?;

        if cur.is_special() {
            return self.next_positions_from_special(token, cur);
        }

        let mut result: Option<Vec<usize>> = None;
        if cur.matches(token) {
            result
                .get_or_insert_with(Vec::new)
                .push(self.node.cur_pos + 1);
        }

        // Test forward matches, skipping optional and zero-or-more tokens.
        let mut next_pos = self.spin(self.node.cur_pos);
        while let Some(pos) = next_pos {
            if rule.rhs_at(pos).is_some_and(|t| t.matches(token)) {
                result.get_or_insert_with(Vec::new).push(pos + 1);
            }
            next_pos = self.spin(pos);
        }
        result
    }

    /// Next plausible positions, greedy and reluctant, when sitting at a
    /// marker. Reaching a marker means the token before it already matched.
    fn next_positions_from_special(
        &self,
        token: &Token,
        special: &GrammarToken,
    ) -> Option<Vec<usize>> {
        let rule = self.rule()?;

        if matches!(special, GrammarToken::End) {
            // More input at a valid end: only the token past the marker may
            // match.
            let pos = rule.next_token_position(self.node.cur_pos)?;
            if rule.rhs_at(pos).is_some_and(|t| t.matches(token)) {
                return Some(vec![pos + 1]);
            }
            return None;
        }

        let mut result: Option<Vec<usize>> = None;

        // Backward repeat: `*` and `+` may match the previous grammar token
        // again.
        if !matches!(special, GrammarToken::Optional) {
            if let Some(prev) = self.prev_grammar_token() {
                if prev.matches(token) {
                    result.get_or_insert_with(Vec::new).push(self.node.cur_pos);
                }
            }
        }

        // Forward matches, skipping optional and zero-or-more tokens.
        let mut next_pos = rule.next_token_position(self.node.cur_pos);
        while let Some(pos) = next_pos {
            if rule.rhs_at(pos).is_some_and(|t| t.matches(token)) {
                result.get_or_insert_with(Vec::new).push(pos + 1);
            }
            next_pos = self.spin(pos);
        }
        result
    }

    /// The next position comparable against the same input when the token
    /// at `pos` may be skipped. A `?`/`*` marker after `pos` grants the
    /// skip; an end marker delegates the question past itself.
    fn spin(&self, pos: usize) -> Option<usize> {
        let rule = self.rule()?;
        match rule.rhs_at(pos + 1) {
            Some(GrammarToken::End) => self.spin(pos + 2),
            Some(GrammarToken::Optional) | Some(GrammarToken::ZeroOrMore) => {
                rule.next_token_position(pos + 1)
            }
            _ => None,
        }
    }

    /// Where the parent of a pushed chain resumes: past a symbol, in place
    /// at a marker (so the marker can keep repeating).
    fn position_increment(&self, pos: usize) -> usize {
        match self.rule().and_then(|r| r.rhs_at(pos)) {
            Some(token) if token.is_special() => pos,
            Some(_) => pos + 1,
            None => pos,
        }
    }

    fn next_pop_states(&self, token: &Token) -> Vec<State> {
        let Some(parent) = self.parent_state() else {
            return Vec::new();
        };
        // The parent's position was already advanced at push time; resume
        // it with the completed child recorded for decoding.
        let resumed = parent.with_last_child(self.clone());
        resumed.next_states(token)
    }

    /// Push chains satisfying the active nonterminal (or, with `filter`,
    /// exactly that symbol) whose innermost rule consumes `input`.
    fn next_push_states(&self, input: &Token, filter: Option<&GrammarToken>) -> Vec<State> {
        let Some(rule) = self.rule() else {
            return Vec::new();
        };
        let mut result = Vec::new();
        let mut pos = self.node.cur_pos;
        let mut pos_inc = self.position_increment(pos);
        let mut lhs = match filter {
            Some(f) => Some(f.clone()),
            None => self.active_grammar_token(),
        };

        while let Some(stop_at) = lhs {
            result.extend(self.collect_push_states(&stop_at, input, pos_inc));
            if filter.is_some() {
                break;
            }
            // Spin to the next position whose token could host the push
            // instead, when the current one is skippable.
            match self.spin(pos) {
                Some(next) => {
                    pos = next;
                    pos_inc = self.position_increment(pos);
                    lhs = rule.rhs_at(pos).cloned();
                }
                None => break,
            }
        }
        result
    }

    fn collect_push_states(
        &self,
        stop_at: &GrammarToken,
        input: &Token,
        next_pos: usize,
    ) -> Vec<State> {
        let Some(paths) = self.node.grammar.find_paths(Some(stop_at), input) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for path in paths {
            let parent_to_push = self.advanced(None, next_pos);
            result.push(self.path_to_state(path.suffix(0), input, Some(parent_to_push)));
        }
        result
    }

    /// Materialize a rule path as a chain of pushed states, outermost
    /// first; only the innermost consumes the input token.
    fn path_to_state(
        &self,
        path: &[RulePos],
        input: &Token,
        parent: Option<State>,
    ) -> State {
        let mut state = parent;
        for (i, rule_pos) in path.iter().enumerate() {
            let token = if i + 1 == path.len() {
                Some(input.clone())
            } else {
                None
            };
            state = Some(State::push(
                self.node.grammar.clone(),
                rule_pos,
                state,
                token,
            ));
        }
        state.expect("rule paths are never empty")
    }

    /// Entry states from the initial state: every suffix of every
    /// unconstrained rule path reaching the input token is an independent
    /// grammar entry point.
    fn deep_push_states(&self, input: &Token) -> Vec<State> {
        let Some(paths) = self.node.grammar.find_paths(None, input) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for path in &paths {
            for start in (0..path.len()).rev() {
                result.push(self.path_to_state(path.suffix(start), input, None));
            }
        }
        result
    }

    /// The active non-special grammar token at the current position,
    /// falling back to the previous one when sitting at a marker.
    fn active_grammar_token(&self) -> Option<GrammarToken> {
        match self.grammar_token() {
            Some(token) if token.is_special() => self.prev_grammar_token(),
            other => other,
        }
    }

    fn rule_ptr(&self) -> usize {
        self.node
            .rule
            .as_ref()
            .map_or(0, |r| Arc::as_ptr(r) as usize)
    }
}

/// States compare equal when they represent the same derivation progress:
/// same rule, position, consumed token, chain position, parent/child
/// presence, and push depth. Callers use this to deduplicate equivalent
/// candidate branches.
impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.node, &other.node) {
            return true;
        }
        self.rule_ptr() == other.rule_ptr()
            && self.node.cur_pos == other.node.cur_pos
            && self.node.token == other.node.token
            && self.chain_pos() == other.chain_pos()
            && self.node.parent.is_some() == other.node.parent.is_some()
            && self.node.last_child.is_some() == other.node.last_child.is_some()
            && self.depth() == other.depth()
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.rule_ptr().hash(hasher);
        self.node.cur_pos.hash(hasher);
        self.node.token.hash(hasher);
        self.chain_pos().hash(hasher);
        self.node.parent.is_some().hash(hasher);
        self.node.last_child.is_some().hash(hasher);
        self.depth().hash(hasher);
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State[{:?},token_pos={},token={:?},chain_pos={},has_parent={},has_children={},depth={}]",
            self.node.rule,
            self.node.cur_pos,
            self.node.token,
            self.chain_pos(),
            self.node.parent.is_some(),
            self.node.last_child.is_some(),
            self.depth()
        )
    }
}
