//! Main module for the rtn library functionality

pub mod decode;
pub mod grammar;
pub mod lexing;
pub mod machine;
pub mod state;
pub mod token;

pub use decode::{CollapseDecoder, DefaultDecoder, ParseTree, StateDecoder};
pub use grammar::{Grammar, GrammarError, Rule};
pub use machine::Machine;
pub use state::State;
pub use token::{
    CategoryRegistry, CategoryTokenFactory, GrammarToken, LiteralTokenFactory, Token,
    TokenFactory, TokenMatcher,
};
