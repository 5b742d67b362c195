//! The line-oriented grammar text format.
//!
//! One rule per line, `LHS <- RHS_TOKEN_1 ... RHS_TOKEN_N`. Lines starting
//! with `#` and blank lines are ignored. Rule tokens are resolved through a
//! caller-supplied [TokenFactory]; the four reserved literals (`?`, `*`,
//! `+`, `.`) become markers. Loading is all-or-nothing: any malformed line
//! aborts with an error naming the offending text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rtn::grammar::Rule;
use crate::rtn::token::TokenFactory;

/// A well-formed rule line: a single LHS token, the arrow, and a non-empty
/// remainder. The stricter shape checks (arrow count, marker placement)
/// happen before and after this match.
static RULE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<lhs>\S+)\s*<-\s*(?P<rhs>\S.*)$").expect("rule-line regex"));

/// Errors raised while loading a grammar. Transition-time mismatches are
/// not errors; they surface as empty successor sets.
#[derive(Debug)]
pub enum GrammarError {
    /// The line is not of the form `LHS <- RHS`.
    MalformedRule { line: String },
    /// Nothing before the `<-`.
    EmptyLhs { line: String },
    /// Nothing after the `<-`.
    EmptyRhs { line: String },
    /// A reserved marker (`?`, `*`, `+`, `.`) used as a rule's LHS.
    SpecialLhs { line: String },
    /// A rule whose RHS begins with a marker has nothing for the marker to
    /// modify.
    LeadingSpecial { line: String },
    /// A rule token the factory could not resolve.
    UnknownCategory { token: String },
    /// Underlying I/O failure while reading a grammar file.
    Io(std::io::Error),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::MalformedRule { line } => {
                write!(f, "rule line '{}' doesn't have form 'LHS <- RHS'", line)
            }
            GrammarError::EmptyLhs { line } => write!(f, "empty LHS in rule line '{}'", line),
            GrammarError::EmptyRhs { line } => write!(f, "empty RHS in rule line '{}'", line),
            GrammarError::SpecialLhs { line } => {
                write!(f, "special token cannot be the LHS of rule line '{}'", line)
            }
            GrammarError::LeadingSpecial { line } => write!(
                f,
                "RHS of rule line '{}' starts with a marker that modifies nothing",
                line
            ),
            GrammarError::UnknownCategory { token } => {
                write!(f, "unknown grammar token '{}'", token)
            }
            GrammarError::Io(err) => write!(f, "failed to read grammar: {}", err),
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrammarError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Parse all rule lines, skipping comments and blanks.
pub(super) fn parse_rules<'a>(
    lines: impl Iterator<Item = &'a str>,
    factory: &dyn TokenFactory,
) -> Result<Vec<Rule>, GrammarError> {
    let mut rules = Vec::new();
    for line in lines {
        if let Some(rule) = parse_rule(line, factory)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Parse a single line; `Ok(None)` for comments and blank lines.
fn parse_rule(
    line: &str,
    factory: &dyn TokenFactory,
) -> Result<Option<Rule>, GrammarError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if line.matches("<-").count() != 1 {
        return Err(GrammarError::MalformedRule {
            line: line.to_string(),
        });
    }

    let Some(caps) = RULE_LINE.captures(line) else {
        // Exactly one arrow but no clean match: diagnose which side is off.
        let (lhs, rhs) = line.split_once("<-").expect("arrow counted above");
        if lhs.trim().is_empty() {
            return Err(GrammarError::EmptyLhs {
                line: line.to_string(),
            });
        }
        if rhs.trim().is_empty() {
            return Err(GrammarError::EmptyRhs {
                line: line.to_string(),
            });
        }
        return Err(GrammarError::MalformedRule {
            line: line.to_string(),
        });
    };

    let lhs = factory.grammar_token(&caps["lhs"])?;
    if lhs.is_special() {
        return Err(GrammarError::SpecialLhs {
            line: line.to_string(),
        });
    }

    let mut rhs = Vec::new();
    for token_text in caps["rhs"].split_whitespace() {
        rhs.push(factory.grammar_token(token_text)?);
    }
    debug_assert!(!rhs.is_empty(), "regex guarantees a non-empty RHS");
    if rhs[0].is_special() {
        return Err(GrammarError::LeadingSpecial {
            line: line.to_string(),
        });
    }

    Ok(Some(Rule::new(lhs, rhs)))
}
