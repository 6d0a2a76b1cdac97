//! Ready-made character class rules.
//!
//! These are plain functions following the matcher contract, so they can be registered under
//! any name. Every token they produce is typed after the function, `digit_run` yields
//! `digit_run` tokens and so on. None of them applies a whitespace policy.

use crate::{MatchResult, Parser, Result, RuleOptions, Token};

pub type CommonRule = for<'a> fn(&'a str) -> MatchResult<'a>;

/// Every rule of this module with the name [`install`] registers it under.
pub const RULES: &[(&str, CommonRule)] = &[
    ("lower", lower),
    ("upper", upper),
    ("alpha", alpha),
    ("digit", digit),
    ("whitespace", whitespace),
    ("lower_run", lower_run),
    ("upper_run", upper_run),
    ("alpha_run", alpha_run),
    ("digit_run", digit_run),
];

fn one<'a>(token_type: &str, input: &'a str, predicate: fn(char) -> bool) -> MatchResult<'a> {
    match input.chars().next() {
        Some(c) if predicate(c) => {
            let (text, rest) = input.split_at(c.len_utf8());
            (Some(Token::leaf(token_type, text)), rest)
        }
        _ => (None, input),
    }
}

fn run<'a>(token_type: &str, input: &'a str, predicate: fn(char) -> bool) -> MatchResult<'a> {
    let end = input
        .char_indices()
        .find(|&(_, c)| !predicate(c))
        .map_or(input.len(), |(i, _)| i);
    match end {
        0 => (None, input),
        _ => {
            let (text, rest) = input.split_at(end);
            (Some(Token::leaf(token_type, text)), rest)
        }
    }
}

pub fn lower(input: &str) -> MatchResult<'_> {
    one("lower", input, char::is_lowercase)
}

pub fn upper(input: &str) -> MatchResult<'_> {
    one("upper", input, char::is_uppercase)
}

pub fn alpha(input: &str) -> MatchResult<'_> {
    one("alpha", input, char::is_alphabetic)
}

pub fn digit(input: &str) -> MatchResult<'_> {
    one("digit", input, |c| c.is_ascii_digit())
}

/// A run of whitespace, not a single character.
pub fn whitespace(input: &str) -> MatchResult<'_> {
    run("whitespace", input, char::is_whitespace)
}

pub fn lower_run(input: &str) -> MatchResult<'_> {
    run("lower_run", input, char::is_lowercase)
}

pub fn upper_run(input: &str) -> MatchResult<'_> {
    run("upper_run", input, char::is_uppercase)
}

pub fn alpha_run(input: &str) -> MatchResult<'_> {
    run("alpha_run", input, char::is_alphabetic)
}

pub fn digit_run(input: &str) -> MatchResult<'_> {
    run("digit_run", input, |c| c.is_ascii_digit())
}

/// Registers every rule of [`RULES`] whose name the parser does not define yet.
///
/// The start rule is left alone, installing into an empty parser does not make `lower` the
/// rule every parse starts from. Returns the number of rules installed.
pub fn install(parser: &mut Parser, options: RuleOptions) -> Result<usize> {
    let main = parser.registry().main_handle();
    let mut installed = 0;
    for &(name, rule) in RULES {
        if parser.registry().contains(name) {
            continue;
        }
        parser.from_function_with(name, rule, options)?;
        installed += 1;
    }
    if !options.main {
        parser.registry_mut().restore_main(main);
    }
    Ok(installed)
}
