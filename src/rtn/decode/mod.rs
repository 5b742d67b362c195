//! Replaying a state's push/pop history into a parse tree.
//!
//! The default decoder is a direct structural mirror of the derivation:
//! the root is the outermost rule's LHS, each pushed child rule contributes
//! a subtree rooted at its own LHS, and each consumed input token
//! contributes a leaf. Decoders are pluggable so presentation concerns
//! (collapsing pass-through productions, relabeling) stay out of the state
//! lattice itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rtn::state::State;
use crate::rtn::token::Token;

/// A decoded derivation. Interior nodes carry rule LHS labels; leaves carry
/// the consumed input tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseTree {
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<Token>,
    children: Vec<ParseTree>,
}

impl ParseTree {
    pub fn node(label: impl Into<String>) -> Self {
        ParseTree {
            label: label.into(),
            token: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(token: Token) -> Self {
        ParseTree {
            label: token.text().to_string(),
            token: Some(token),
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The consumed input token, present on leaves only.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn children(&self) -> &[ParseTree] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn push_child(&mut self, child: ParseTree) {
        self.children.push(child);
    }

    /// All leaves, left to right.
    pub fn leaves(&self) -> Vec<&ParseTree> {
        let mut result = Vec::new();
        self.collect_leaves(&mut result);
        result
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ParseTree>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }
}

/// Renders the classic s-expression form, e.g. `(y a (x b) c)`.
impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            return write!(f, "{}", self.label);
        }
        write!(f, "({}", self.label)?;
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, ")")
    }
}

/// Replays a state's history into a tree. Implementations may filter or
/// relabel nodes without altering the underlying state lattice.
pub trait StateDecoder: fmt::Debug + Send + Sync {
    /// `None` only for the synthetic initial state, which has no history.
    fn decode(&self, state: &State) -> Option<ParseTree>;
}

/// The structural mirror of the push/pop history.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDecoder;

impl StateDecoder for DefaultDecoder {
    fn decode(&self, state: &State) -> Option<ParseTree> {
        state.rule()?;
        // Decode the innermost rule invocation, then climb: the finished
        // subtree is the enclosing rule's most recent constituent.
        let mut subtree = decode_invocation(state);
        let mut cur = state.clone();
        while let Some(parent) = cur.parent_state() {
            let mut node = decode_invocation(&parent);
            node.push_child(subtree);
            subtree = node;
            cur = parent;
        }
        Some(subtree)
    }
}

/// The subtree for one rule invocation, walking its consumption history
/// oldest-first: completed child invocations hang off `last_child` links,
/// consumed input tokens become leaves.
fn decode_invocation(state: &State) -> ParseTree {
    let label = state
        .rule()
        .map(|r| r.lhs().name().to_string())
        .unwrap_or_default();
    let mut node = ParseTree::node(label);

    let mut chain = Vec::new();
    let mut cur = Some(state.clone());
    while let Some(s) = cur {
        cur = s.prev_state();
        chain.push(s);
    }
    for s in chain.into_iter().rev() {
        if let Some(child) = s.last_child_state() {
            node.push_child(decode_invocation(&child));
        }
        if let Some(token) = s.input_token() {
            node.push_child(ParseTree::leaf(token.clone()));
        }
    }
    node
}

/// An alternate decoder that collapses single-child pass-through
/// productions: a node whose only constituent is another production is
/// replaced by that inner production.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollapseDecoder;

impl StateDecoder for CollapseDecoder {
    fn decode(&self, state: &State) -> Option<ParseTree> {
        DefaultDecoder.decode(state).map(collapse)
    }
}

fn collapse(tree: ParseTree) -> ParseTree {
    let ParseTree {
        label,
        token,
        children,
    } = tree;
    let mut children: Vec<ParseTree> = children.into_iter().map(collapse).collect();
    if children.len() == 1 && !children[0].is_leaf() {
        return children.pop().expect("length checked");
    }
    ParseTree {
        label,
        token,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtn::grammar::Grammar;
    use crate::rtn::token::LiteralTokenFactory;

    fn accepted(lines: &[&str], input: &[&str]) -> Vec<State> {
        let grammar = Grammar::load_lines(lines, &LiteralTokenFactory).unwrap();
        let mut states = vec![grammar.first_state()];
        for symbol in input {
            let token = Token::symbol(*symbol);
            states = states.iter().flat_map(|s| s.next_states(&token)).collect();
        }
        states.retain(State::is_terminal);
        states
    }

    #[test]
    fn test_display_is_sexpr() {
        let mut tree = ParseTree::node("x");
        tree.push_child(ParseTree::leaf(Token::symbol("a")));
        let mut inner = ParseTree::node("y");
        inner.push_child(ParseTree::leaf(Token::symbol("b")));
        tree.push_child(inner);
        assert_eq!(tree.to_string(), "(x a (y b))");
    }

    #[test]
    fn test_flat_rule_round_trip() {
        let states = accepted(&["x <- a b c"], &["a", "b", "c"]);
        assert_eq!(states.len(), 1);
        let tree = states[0].build_tree().unwrap();
        assert_eq!(tree.to_string(), "(x a b c)");
        assert_eq!(tree.leaves().len(), 3);
    }

    #[test]
    fn test_pushed_rule_becomes_subtree() {
        let states = accepted(&["y <- a x c", "x <- b"], &["a", "b", "c"]);
        assert_eq!(states.len(), 1);
        let tree = states[0].build_tree().unwrap();
        assert_eq!(tree.to_string(), "(y a (x b) c)");
    }

    #[test]
    fn test_unpopped_terminal_state_decodes_full_spine() {
        // The inner rule ends exactly when input ends; nothing ever popped.
        let states = accepted(&["y <- a x", "x <- b"], &["a", "b"]);
        assert_eq!(states.len(), 1);
        let tree = states[0].build_tree().unwrap();
        assert_eq!(tree.to_string(), "(y a (x b))");
    }

    #[test]
    fn test_initial_state_decodes_to_none() {
        let grammar = Grammar::load_lines(&["x <- a"], &LiteralTokenFactory).unwrap();
        assert!(grammar.first_state().build_tree().is_none());
    }

    #[test]
    fn test_collapse_decoder_drops_pass_through() {
        let states = accepted(&["a <- b", "b <- c"], &["c"]);
        assert_eq!(states.len(), 2);
        let full: Vec<String> = states
            .iter()
            .map(|s| s.build_tree_with(&DefaultDecoder).unwrap().to_string())
            .collect();
        assert!(full.contains(&"(a (b c))".to_string()));
        assert!(full.contains(&"(b c)".to_string()));

        let collapsed: Vec<String> = states
            .iter()
            .map(|s| s.build_tree_with(&CollapseDecoder).unwrap().to_string())
            .collect();
        assert_eq!(collapsed, vec!["(b c)".to_string(), "(b c)".to_string()]);
    }

    #[test]
    fn test_tree_serializes() {
        let states = accepted(&["x <- a"], &["a"]);
        let tree = states[0].build_tree().unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains("\"label\":\"x\""));
        let back: ParseTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
