//! Acceptance tests driving whole token streams through the engine and
//! checking every decoded parse, including duplicate derivations and
//! rejection sets.

use rtn::rtn::{Grammar, LiteralTokenFactory, Machine, State, Token};

fn machine(rules: &[&str]) -> Machine {
    Machine::new(Grammar::load_lines(rules, &LiteralTokenFactory).unwrap())
}

/// All decoded parses of the input, sorted for order-insensitive
/// comparison. Duplicate derivations are kept: the engine does not dedup.
fn parses(machine: &Machine, input: &[&str]) -> Vec<String> {
    let tokens: Vec<Token> = input.iter().map(|s| Token::symbol(*s)).collect();
    let mut trees: Vec<String> = machine
        .accepted(tokens)
        .iter()
        .map(|state: &State| state.build_tree().unwrap().to_string())
        .collect();
    trees.sort();
    trees
}

fn check(machine: &Machine, input: &[&str], expected: &[&str]) {
    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(parses(machine, input), expected, "input: {:?}", input);
}

#[test]
fn test_self_recursive_rule() {
    let m = machine(&["x <- a x c"]);
    check(&m, &["a", "x", "c"], &["(x a x c)"]);
    check(&m, &["a", "a", "x", "c", "c"], &["(x a (x a x c) c)"]);
    check(
        &m,
        &["a", "a", "a", "x", "c", "c", "c"],
        &["(x a (x a (x a x c) c) c)"],
    );
    check(&m, &["a", "x"], &[]);
}

#[test]
fn test_optional() {
    let m = machine(&["x <- a b ? c"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "c"], &["(x a c)"]);
    check(&m, &["a", "b", "b", "c"], &[]);
}

#[test]
fn test_zero_or_more() {
    let m = machine(&["x <- a b * c"]);
    check(&m, &["a", "c"], &["(x a c)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "b", "b", "c"], &["(x a b b c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &["(x a b b b c)"]);
}

#[test]
fn test_one_or_more() {
    let m = machine(&["x <- a b + c"]);
    check(&m, &["a", "c"], &[]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "b", "b", "c"], &["(x a b b c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &["(x a b b b c)"]);
}

#[test]
fn test_end_marker() {
    let m = machine(&["x <- a b . c"]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a"], &[]);
}

#[test]
fn test_end_with_optional_tail() {
    let m = machine(&["x <- a b ? . c"]);
    check(&m, &["a"], &["(x a)"]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "c"], &["(x a c)"]);
}

#[test]
fn test_end_with_optional_on_both_sides() {
    let m = machine(&["x <- a b ? . c ?"]);
    check(&m, &["a"], &["(x a)"]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "c"], &["(x a c)"]);
}

#[test]
fn test_all_optional_tail_without_end() {
    let m = machine(&["x <- a b ? c ?"]);
    check(&m, &["a"], &["(x a)"]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "c"], &["(x a c)"]);
}

#[test]
fn test_end_does_not_make_the_preceding_token_optional() {
    let m = machine(&["x <- a b . c ?"]);
    check(&m, &["a"], &[]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "c"], &[]);
}

#[test]
fn test_end_with_zero_or_more() {
    let m = machine(&["x <- a b * . c"]);
    check(&m, &["a"], &["(x a)"]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "b"], &["(x a b b)"]);
    check(&m, &["a", "b", "b", "b"], &["(x a b b b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &["(x a b b b c)"]);
    check(&m, &["a", "c"], &["(x a c)"]);
}

#[test]
fn test_end_with_zero_or_more_on_both_sides() {
    let m = machine(&["x <- a b * . c *"]);
    check(&m, &["a"], &["(x a)"]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "b", "b"], &["(x a b b b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &["(x a b b b c)"]);
    check(&m, &["a", "b", "b", "b", "c", "c"], &["(x a b b b c c)"]);
    check(&m, &["a", "c"], &["(x a c)"]);
}

#[test]
fn test_end_with_one_or_more() {
    let m = machine(&["x <- a b + . c"]);
    check(&m, &["a"], &[]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "b"], &["(x a b b)"]);
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &["(x a b b b c)"]);
}

#[test]
fn test_explicit_repeats_are_not_collapsed() {
    let m = machine(&["x <- a b b c"]);
    check(&m, &["a"], &[]);
    check(&m, &["a", "b"], &[]);
    check(&m, &["a", "b", "b"], &[]);
    check(&m, &["a", "b", "b", "b"], &[]);
    check(&m, &["a", "b", "c"], &[]);
    check(&m, &["a", "b", "b", "c"], &["(x a b b c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &[]);
}

#[test]
fn test_repeat_then_same_token_again() {
    let m = machine(&["x <- a b + . b c"]);
    check(&m, &["a"], &[]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "b"], &["(x a b b)"]);
    check(&m, &["a", "b", "b", "b"], &["(x a b b b)"]);
    check(&m, &["a", "b", "c"], &[]);
    check(&m, &["a", "b", "b", "c"], &["(x a b b c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &["(x a b b b c)"]);
}

#[test]
fn test_ambiguous_repeat_positions_duplicate_parses() {
    let m = machine(&["x <- a b + . b * c"]);
    check(&m, &["a"], &[]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "b"], &["(x a b b)"]);
    check(&m, &["a", "b", "b", "b"], &["(x a b b b)"]);
    check(&m, &["a", "b", "b", "c"], &["(x a b b c)", "(x a b b c)"]);
    check(
        &m,
        &["a", "b", "b", "b", "c"],
        &["(x a b b b c)", "(x a b b b c)", "(x a b b b c)"],
    );
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
}

#[test]
fn test_ambiguous_repeat_positions_with_optional_tail() {
    let m = machine(&["x <- a b + . b * c ?"]);
    check(&m, &["a"], &[]);
    check(&m, &["a", "b"], &["(x a b)"]);
    check(&m, &["a", "b", "b"], &["(x a b b)", "(x a b b)"]);
    check(
        &m,
        &["a", "b", "b", "b"],
        &["(x a b b b)", "(x a b b b)", "(x a b b b)"],
    );
    check(&m, &["a", "b", "b", "c"], &["(x a b b c)", "(x a b b c)"]);
    check(
        &m,
        &["a", "b", "b", "b", "c"],
        &["(x a b b b c)", "(x a b b b c)", "(x a b b b c)"],
    );
    check(&m, &["a", "b", "c"], &["(x a b c)"]);
}

#[test]
fn test_spin_past_optionals() {
    let m = machine(&["x <- a b ? b * c"]);
    check(&m, &["a"], &[]);
    check(&m, &["a", "b", "c"], &["(x a b c)", "(x a b c)"]);
    check(&m, &["a", "b", "b", "c"], &["(x a b b c)", "(x a b b c)"]);
    check(
        &m,
        &["a", "b", "b", "b", "c"],
        &["(x a b b b c)", "(x a b b b c)"],
    );
}

#[test]
fn test_push_only_where_a_rule_applies() {
    let m = machine(&["y <- a x c"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    // x names no rule here, so nothing nests.
    check(&m, &["a", "a", "x", "c", "c"], &[]);
    check(&m, &["a", "x"], &[]);
    check(&m, &["a", "c"], &[]);
}

#[test]
fn test_push_into_repeating_subrule() {
    let m = machine(&["y <- a x c", "x <- b +"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    check(&m, &["a", "b", "c"], &["(y a (x b) c)"]);
    check(&m, &["a", "b", "b", "c"], &["(y a (x b b) c)"]);
    check(&m, &["a", "b", "b", "b", "c"], &["(y a (x b b b) c)"]);
    check(&m, &["a", "x"], &[]);
    check(&m, &["a", "b"], &[]);
    check(&m, &["a", "c"], &[]);
}

#[test]
fn test_optional_nonterminal() {
    let m = machine(&["y <- a x ? c", "x <- b +"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    check(&m, &["a", "b", "c"], &["(y a (x b) c)"]);
    check(&m, &["a", "b", "b", "c"], &["(y a (x b b) c)"]);
    check(&m, &["a", "x"], &[]);
    check(&m, &["a", "b"], &[]);
    check(&m, &["a", "c"], &["(y a c)"]);
}

#[test]
fn test_repeated_nonterminal_yields_every_bracketing() {
    let m = machine(&["y <- a x + c", "x <- b +"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    check(&m, &["a", "b", "c"], &["(y a (x b) c)"]);
    check(
        &m,
        &["a", "b", "b", "c"],
        &["(y a (x b b) c)", "(y a (x b) (x b) c)"],
    );
    check(
        &m,
        &["a", "b", "b", "b", "c"],
        &[
            "(y a (x b b b) c)",
            "(y a (x b b) (x b) c)",
            "(y a (x b) (x b b) c)",
            "(y a (x b) (x b) (x b) c)",
        ],
    );
    check(&m, &["a", "x"], &[]);
    check(&m, &["a", "b"], &[]);
    check(&m, &["a", "c"], &[]);
}

#[test]
fn test_zero_or_more_nonterminal() {
    let m = machine(&["y <- a x * c", "x <- b +"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    check(&m, &["a", "b", "c"], &["(y a (x b) c)"]);
    check(
        &m,
        &["a", "b", "b", "c"],
        &["(y a (x b b) c)", "(y a (x b) (x b) c)"],
    );
    check(&m, &["a", "c"], &["(y a c)"]);
}

#[test]
fn test_optional_single_token_subrule() {
    let m = machine(&["y <- a x ? c", "x <- b"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    check(&m, &["a", "b", "c"], &["(y a (x b) c)"]);
    check(&m, &["a", "b", "b", "c"], &[]);
    check(&m, &["a", "x"], &[]);
    check(&m, &["a", "b"], &[]);
    check(&m, &["a", "c"], &["(y a c)"]);
}

#[test]
fn test_repeated_single_token_subrule() {
    let m = machine(&["y <- a x + c", "x <- b"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    check(&m, &["a", "b", "c"], &["(y a (x b) c)"]);
    check(&m, &["a", "b", "b", "c"], &["(y a (x b) (x b) c)"]);
    check(
        &m,
        &["a", "b", "b", "b", "c"],
        &["(y a (x b) (x b) (x b) c)"],
    );
    check(&m, &["a", "c"], &[]);
}

#[test]
fn test_zero_or_more_single_token_subrule() {
    let m = machine(&["y <- a x * c", "x <- b"]);
    check(&m, &["a", "x", "c"], &["(y a x c)"]);
    check(&m, &["a", "b", "c"], &["(y a (x b) c)"]);
    check(&m, &["a", "b", "b", "c"], &["(y a (x b) (x b) c)"]);
    check(&m, &["a", "c"], &["(y a c)"]);
    // Literal x's and pushed x's can interleave.
    check(
        &m,
        &["a", "x", "b", "x", "b", "c"],
        &["(y a x (x b) x (x b) c)"],
    );
}

#[test]
fn test_deep_pushes_and_pops() {
    let m = machine(&[
        "x <- x0 x1",
        "x0 <- x2",
        "x2 <- x3",
        "x1 <- x4",
        "x4 <- x5 x2",
    ]);
    check(
        &m,
        &["x3", "x5", "x3"],
        &["(x (x0 (x2 x3)) (x1 (x4 x5 (x2 x3))))"],
    );
}
