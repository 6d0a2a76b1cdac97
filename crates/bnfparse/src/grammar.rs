//! Compiler for the grammar text DSL.
//!
//! A grammar is a block of `name := body` lines. The body is a list of quoted literals and rule
//! names, split into ordered alternatives by `|`. There are no repetition operators, repetition
//! is written as recursion (`digits := digit digits | digit`).

use std::{collections::HashSet, rc::Rc};

use crate::{
    lexer::{is_ident_byte, lex, unescape_literal, LexToken, Lexer, TokenKind},
    Error, GrammarErrorKind, Result, RuleSpec,
};

#[derive(Clone, Debug)]
pub struct RuleDef {
    pub name: Rc<str>,
    pub spec: RuleSpec,
    /// 1-based line of the definition within its block.
    pub line: usize,
}

/// Compiles every rule of a grammar block, one rule per line. Blank lines are skipped.
///
/// The block either compiles as a whole or not at all, the first malformed line is reported.
pub fn compile(text: &str) -> Result<Vec<RuleDef>> {
    compile_entries(text.lines())
}

/// Like [`compile`] but with rules separated by `delimiter` instead of newlines, so that
/// `a := "a"; b := "b"` fits on one line. The delimiter is not recognized inside quotes, a
/// literal containing it splits the rule. Error positions count entries rather than lines.
pub fn compile_delimited(text: &str, delimiter: &str) -> Result<Vec<RuleDef>> {
    if delimiter.is_empty() {
        return compile_entries(std::iter::once(text));
    }
    compile_entries(text.split(delimiter))
}

fn compile_entries<'a>(entries: impl Iterator<Item = &'a str>) -> Result<Vec<RuleDef>> {
    let mut defs = Vec::new();
    let mut seen = HashSet::new();

    for (i, src) in entries.enumerate() {
        let line = i + 1;
        if src.trim().is_empty() {
            continue;
        }

        let (name, spec) = compile_line(src).map_err(|kind| Error::Grammar { line, kind })?;
        if !seen.insert(name.clone()) {
            return Err(Error::Grammar {
                line,
                kind: GrammarErrorKind::DuplicateRule(name.to_string()),
            });
        }
        defs.push(RuleDef { name, spec, line });
    }

    log::debug!("compiled grammar block with {} rules", defs.len());
    Ok(defs)
}

/// Compiles a single `name := body` line.
pub fn compile_line(src: &str) -> Result<(Rc<str>, RuleSpec), GrammarErrorKind> {
    let tokens = lex(&mut Lexer::new(src))?;

    let define = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Define)
        .ok_or(GrammarErrorKind::MissingSeparator)?;

    let [name] = &tokens[..define] else {
        return Err(GrammarErrorKind::InvalidName);
    };
    let name = match name.kind {
        TokenKind::Ident => &src[name.span],
        _ => return Err(GrammarErrorKind::InvalidName),
    };
    if !is_rule_name(name) {
        return Err(GrammarErrorKind::InvalidName);
    }

    let spec = body_spec(src, &tokens[define + 1..])?;
    Ok((name.into(), spec))
}

/// Compiles the right-hand side of a rule on its own.
pub fn compile_body(src: &str) -> Result<RuleSpec, GrammarErrorKind> {
    let tokens = lex(&mut Lexer::new(src))?;
    body_spec(src, &tokens)
}

fn body_spec(src: &str, body: &[LexToken]) -> Result<RuleSpec, GrammarErrorKind> {
    if body.is_empty() {
        return Err(GrammarErrorKind::EmptyBody);
    }

    let mut alternatives = Vec::new();
    for alternative in body.split(|t| t.kind == TokenKind::Pipe) {
        if alternative.is_empty() {
            return Err(GrammarErrorKind::EmptyAlternative);
        }
        let mut items = alternative
            .iter()
            .map(|t| body_item(src, t))
            .collect::<Result<Vec<_>, _>>()?;

        let spec = match items.len() {
            1 => items.remove(0),
            _ => RuleSpec::Sequence(items),
        };
        alternatives.push(spec);
    }

    Ok(match alternatives.len() {
        1 => alternatives.remove(0),
        _ => RuleSpec::Alternation(alternatives),
    })
}

fn body_item(src: &str, token: &LexToken) -> Result<RuleSpec, GrammarErrorKind> {
    let text = &src[token.span];
    match token.kind {
        TokenKind::Ident => Ok(RuleSpec::reference(text)),
        TokenKind::Literal => {
            let literal = unescape_literal(text);
            if literal.is_empty() {
                return Err(GrammarErrorKind::EmptyLiteral);
            }
            Ok(RuleSpec::literal(&*literal))
        }
        // a second `:=`
        TokenKind::Define => Err(GrammarErrorKind::UnexpectedCharacter(':')),
        TokenKind::Pipe => Err(GrammarErrorKind::UnexpectedCharacter('|')),
    }
}

/// Rule names are identifiers that do not start with a digit.
pub fn is_rule_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    let first = bytes.next();
    first.is_some_and(|c| is_ident_byte(c) && !c.is_ascii_digit()) && bytes.all(is_ident_byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(line: &str) -> String {
        compile_line(line).unwrap().1.to_string()
    }

    fn line_error(line: &str) -> GrammarErrorKind {
        compile_line(line).unwrap_err()
    }

    #[test]
    fn body_shapes() {
        assert_eq!(spec("a := b"), "b");
        assert_eq!(spec("a := 'x'"), "\"x\"");
        assert_eq!(spec(r#"a := "(" b ")""#), r#""(" b ")""#);
        assert_eq!(spec("a := b a | b"), "b a | b");
        assert_eq!(spec("  a:=b|c  "), "b | c");

        let (name, spec) = compile_line("digits := digit digits | digit").unwrap();
        assert_eq!(&*name, "digits");
        let RuleSpec::Alternation(branches) = spec else {
            panic!("expected alternation");
        };
        assert!(branches[0].is_sequence());
        assert!(matches!(&branches[1], RuleSpec::Reference(name) if &**name == "digit"));
    }

    #[test]
    fn literals_keep_spaces_and_escapes() {
        let (_, verb) = compile_line(r#"verb := "voted for" | 'it\'s'"#).unwrap();
        let RuleSpec::Alternation(branches) = verb else {
            panic!("expected alternation");
        };
        assert!(matches!(&branches[0], RuleSpec::Literal(text) if &**text == "voted for"));
        assert!(matches!(&branches[1], RuleSpec::Literal(text) if &**text == "it's"));
        // the alternation operator inside quotes is just text
        assert_eq!(spec(r#"op := "|""#), r#""|""#);
    }

    #[test]
    fn malformed_lines() {
        use GrammarErrorKind::*;
        assert_eq!(line_error("a b c"), MissingSeparator);
        assert_eq!(line_error(":= b"), InvalidName);
        assert_eq!(line_error("a b := c"), InvalidName);
        assert_eq!(line_error("'a' := c"), InvalidName);
        assert_eq!(line_error("9a := c"), InvalidName);
        assert_eq!(line_error("a :="), EmptyBody);
        assert_eq!(line_error("a := | b"), EmptyAlternative);
        assert_eq!(line_error("a := b |"), EmptyAlternative);
        assert_eq!(line_error("a := b || c"), EmptyAlternative);
        assert_eq!(line_error("a := ''"), EmptyLiteral);
        assert_eq!(line_error("a := \"b"), UnterminatedLiteral);
        assert_eq!(line_error("a := b := c"), UnexpectedCharacter(':'));
        assert_eq!(line_error("a := b+"), UnexpectedCharacter('+'));
    }

    #[test]
    fn standalone_body() {
        let spec = compile_body("alpha word | alpha").unwrap();
        assert_eq!(spec.to_string(), "alpha word | alpha");
        assert_eq!(compile_body("  ").unwrap_err(), GrammarErrorKind::EmptyBody);
        assert_eq!(
            compile_body("a := b").unwrap_err(),
            GrammarErrorKind::UnexpectedCharacter(':')
        );
        assert!(is_rule_name("digit_run"));
        assert!(!is_rule_name("2nd"));
        assert!(!is_rule_name("a-b"));
        assert!(!is_rule_name(""));
    }

    #[test]
    fn delimited_block() {
        let defs = compile_delimited(r#"pair := item item; item := "a" | "b";"#, ";").unwrap();
        let names = defs.iter().map(|d| &*d.name).collect::<Vec<_>>();
        assert_eq!(names, ["pair", "item"]);
        assert_eq!(defs[1].spec.to_string(), r#""a" | "b""#);

        let err = compile_delimited("a := 'a' ;; b := ", ";").unwrap_err();
        assert!(matches!(
            err,
            Error::Grammar {
                line: 3,
                kind: GrammarErrorKind::EmptyBody
            }
        ));

        // no delimiter means one rule
        assert_eq!(compile_delimited("a := 'a' 'b'", "").unwrap().len(), 1);
    }

    #[test]
    fn compile_block() {
        let defs = compile(
            r#"
            programme := if_stmt | expression

            if_stmt   := "if" expression "then" expression
            "#,
        )
        .unwrap();
        let names = defs.iter().map(|d| &*d.name).collect::<Vec<_>>();
        assert_eq!(names, ["programme", "if_stmt"]);
        assert_eq!(defs[0].line, 2);
        assert_eq!(defs[1].line, 4);
    }

    #[test]
    fn block_errors_carry_line() {
        let err = compile("a := 'a'\n\nb := |").unwrap_err();
        assert!(matches!(
            err,
            Error::Grammar {
                line: 3,
                kind: GrammarErrorKind::EmptyAlternative
            }
        ));

        let err = compile("a := 'a'\nb := a\na := 'b'").unwrap_err();
        assert!(matches!(
            err,
            Error::Grammar {
                line: 3,
                kind: GrammarErrorKind::DuplicateRule(ref name)
            } if name == "a"
        ));

        assert!(compile("").unwrap().is_empty());
    }
}
