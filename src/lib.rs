//! # rtn
//!
//! A recursive transition network (RTN) grammar engine.
//!
//! Rules are loaded at runtime from a line-oriented text format
//! (`LHS <- RHS_TOKEN ...`) and drive a finite-state lattice extended with a
//! call/return stack: a rule position that names another rule's left-hand
//! side "pushes" into that rule and "pops" back when it completes. The
//! engine consumes one input token at a time and returns every grammatically
//! valid continuation, so ambiguous grammars yield several parallel states
//! rather than a single winner. Accepted states replay their push/pop
//! history into parse trees.
//!
//! The crate deliberately stops at the grammar boundary: tokenization of
//! real input, ranking of competing parses, and any persistence of compiled
//! grammars are caller concerns. A small logos-based symbol tokenizer is
//! included for driving the engine from whitespace-separated text.

#![allow(rustdoc::invalid_html_tags)]

pub mod rtn;
