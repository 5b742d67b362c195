//! A breadth-first driver over the state lattice.
//!
//! The engine itself only answers "what follows this state over this
//! token"; something still has to carry every live branch across a whole
//! token stream. This driver does the simplest complete thing: advance all
//! branches one token at a time, drop the stream as unparseable as soon as
//! no branch survives, and report the branches that are terminal at every
//! push level once input is exhausted. Callers with ranking, pruning, or
//! chart-integration needs drive [State::next_states] themselves.

use crate::rtn::grammar::Grammar;
use crate::rtn::state::State;
use crate::rtn::token::Token;

#[derive(Debug, Clone)]
pub struct Machine {
    grammar: Grammar,
}

impl Machine {
    pub fn new(grammar: Grammar) -> Self {
        Machine { grammar }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// All live states after consuming the whole stream; empty as soon as
    /// any token fits nowhere. Equivalent duplicate branches are kept.
    pub fn run(&self, tokens: impl IntoIterator<Item = Token>) -> Vec<State> {
        let mut states = vec![self.grammar.first_state()];
        for token in tokens {
            let mut next = Vec::new();
            for state in &states {
                next.extend(state.next_states(&token));
            }
            if next.is_empty() {
                return Vec::new();
            }
            states = next;
        }
        states
    }

    /// The complete parses: live states that are terminal at every level.
    pub fn accepted(&self, tokens: impl IntoIterator<Item = Token>) -> Vec<State> {
        let mut states = self.run(tokens);
        states.retain(State::is_terminal);
        states
    }
}
