//! Loading behavior of the line-oriented grammar format: skipping rules,
//! fail-fast errors, and the file adapter.

use rstest::rstest;
use rtn::rtn::{Grammar, GrammarError, LiteralTokenFactory, Machine, Token};

#[test]
fn test_comments_and_blank_lines_are_ignored() {
    let grammar = Grammar::load(
        "# sentence patterns\n\
         \n\
         x <- a b\n\
         \n\
         # trailing comment\n",
        &LiteralTokenFactory,
    )
    .unwrap();
    assert_eq!(grammar.rules().count(), 1);
}

#[test]
fn test_loaded_grammar_parses() {
    let grammar = Grammar::load("x <- a b\n", &LiteralTokenFactory).unwrap();
    let machine = Machine::new(grammar);
    let input = vec![Token::symbol("a"), Token::symbol("b")];
    assert_eq!(machine.accepted(input).len(), 1);
}

#[rstest]
#[case::no_arrow("x a b")]
#[case::two_arrows("x <- a <- b")]
#[case::multi_token_lhs("x y <- a")]
fn test_malformed_lines(#[case] line: &str) {
    let result = Grammar::load(line, &LiteralTokenFactory);
    assert!(matches!(result, Err(GrammarError::MalformedRule { .. })));
}

#[test]
fn test_load_aborts_on_first_bad_line() {
    let result = Grammar::load("x <- a\nbroken line\ny <- b\n", &LiteralTokenFactory);
    let err = result.err().expect("load must fail");
    // The error names the offending line.
    assert!(err.to_string().contains("broken line"), "got: {}", err);
}

#[test]
fn test_empty_sides_are_distinct_errors() {
    assert!(matches!(
        Grammar::load("<- a", &LiteralTokenFactory),
        Err(GrammarError::EmptyLhs { .. })
    ));
    assert!(matches!(
        Grammar::load("x <- ", &LiteralTokenFactory),
        Err(GrammarError::EmptyRhs { .. })
    ));
}

#[test]
fn test_marker_misuse_is_rejected() {
    assert!(matches!(
        Grammar::load("? <- a", &LiteralTokenFactory),
        Err(GrammarError::SpecialLhs { .. })
    ));
    assert!(matches!(
        Grammar::load("x <- * a", &LiteralTokenFactory),
        Err(GrammarError::LeadingSpecial { .. })
    ));
}

#[test]
fn test_load_file_round_trip() {
    let path = std::env::temp_dir().join("rtn_grammar_loading_test.rtn");
    std::fs::write(&path, "x <- a b ? c\n").unwrap();
    let grammar = Grammar::load_file(&path, &LiteralTokenFactory).unwrap();
    std::fs::remove_file(&path).ok();

    let machine = Machine::new(grammar);
    let input = vec![Token::symbol("a"), Token::symbol("c")];
    assert_eq!(machine.accepted(input).len(), 1);
}

#[test]
fn test_load_missing_file_is_an_io_error() {
    let result = Grammar::load_file("/nonexistent/grammar.rtn", &LiteralTokenFactory);
    assert!(matches!(result, Err(GrammarError::Io(_))));
}
