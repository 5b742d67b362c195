//! Command-line interface for rtn
//! Loads a grammar file, drives whitespace-separated token lines through the
//! engine, and prints every accepted parse.
//!
//! Usage:
//!   rtn `<grammar>` [--input `<file>`] [--format `<format>`]
//!
//! Token lines are read from the input file, or from stdin when no input is
//! given. One line is one token stream; each accepted parse of the line is
//! printed in the chosen format.

use std::io::Read;

use clap::{Arg, Command};

use rtn::rtn::lexing::tokenize_line;
use rtn::rtn::{Grammar, LiteralTokenFactory, Machine, ParseTree};

fn main() {
    let matches = Command::new("rtn")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A recursive transition network grammar engine")
        .arg_required_else_help(true)
        .arg(
            Arg::new("grammar")
                .help("Path to the grammar file (one 'LHS <- RHS' rule per line)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .help("File of token lines to parse (default: stdin)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format: 'sexpr', 'json', or 'yaml'")
                .default_value("sexpr"),
        )
        .get_matches();

    let grammar_path = matches.get_one::<String>("grammar").unwrap();
    let format = matches.get_one::<String>("format").unwrap();

    let grammar = Grammar::load_file(grammar_path, &LiteralTokenFactory).unwrap_or_else(|e| {
        eprintln!("Error loading grammar: {}", e);
        std::process::exit(1);
    });
    let machine = Machine::new(grammar);

    let text = match matches.get_one::<String>("input") {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading input: {}", e);
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
                eprintln!("Error reading stdin: {}", e);
                std::process::exit(1);
            });
            buf
        }
    };

    for line in text.lines() {
        let tokens = tokenize_line(line);
        if tokens.is_empty() {
            continue;
        }
        let parses: Vec<ParseTree> = machine
            .accepted(tokens)
            .iter()
            .filter_map(|state| state.build_tree())
            .collect();
        if parses.is_empty() {
            eprintln!("no parse: {}", line.trim());
            continue;
        }
        print!("{}", format_parses(&parses, format));
    }
}

/// Render the accepted parses of one line in the requested format.
fn format_parses(parses: &[ParseTree], format: &str) -> String {
    match format {
        "sexpr" => {
            let mut out = String::new();
            for parse in parses {
                out.push_str(&parse.to_string());
                out.push('\n');
            }
            out
        }
        "json" => {
            let mut out = serde_json::to_string_pretty(parses).unwrap_or_else(|e| {
                eprintln!("Error formatting parses: {}", e);
                std::process::exit(1);
            });
            out.push('\n');
            out
        }
        "yaml" => serde_yaml::to_string(parses).unwrap_or_else(|e| {
            eprintln!("Error formatting parses: {}", e);
            std::process::exit(1);
        }),
        other => {
            eprintln!("Format '{}' not supported; use sexpr, json, or yaml", other);
            std::process::exit(1);
        }
    }
}
