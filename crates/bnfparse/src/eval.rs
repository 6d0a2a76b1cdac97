//! The recursive-descent rule evaluator.
//!
//! Every evaluation step takes the unconsumed suffix of the source and returns the token it
//! produced together with the new suffix. A failing step always hands back the suffix it was
//! given, so sequences never commit partially and alternation branches all start from the same
//! place. Errors (`Err`) are not failures to match: they abort the whole evaluation.

use std::rc::Rc;

use crate::{
    token::{LITERAL, SEQUENCE},
    as_suffix, MatchResult, Registry, Result, Rule, RuleSpec, Token, WhitespacePolicy,
};

/// A token together with whether some rule already named it.
struct Matched {
    token: Token,
    named: bool,
}

impl Matched {
    fn anonymous(token: Token) -> Matched {
        Matched {
            token,
            named: false,
        }
    }
    fn named(token: Token) -> Matched {
        Matched { token, named: true }
    }
}

type Step<'a> = (Option<Matched>, &'a str);

pub struct Evaluator<'g, 'a> {
    registry: &'g Registry,
    whitespace: &'g WhitespacePolicy,
    /// Complete input, every suffix handled by the evaluator points into it.
    source: &'a str,
}

impl<'g, 'a> Evaluator<'g, 'a> {
    pub fn new(
        registry: &'g Registry,
        whitespace: &'g WhitespacePolicy,
        source: &'a str,
    ) -> Evaluator<'g, 'a> {
        Evaluator {
            registry,
            whitespace,
            source,
        }
    }

    /// Evaluates a named rule; the resulting token is typed after the rule.
    pub fn evaluate_rule(&self, rule: &Rule, input: &'a str) -> Result<MatchResult<'a>> {
        let (matched, rest) = self.rule(rule, input)?;
        Ok((matched.map(|m| m.token), rest))
    }

    /// Evaluates a bare rule body. Literals and sequences at its root keep their generic types.
    pub fn evaluate(&self, spec: &RuleSpec, input: &'a str) -> Result<MatchResult<'a>> {
        let (matched, rest) = self.spec(spec, input)?;
        Ok((matched.map(|m| m.token), rest))
    }

    fn rule(&self, rule: &Rule, input: &'a str) -> Result<Step<'a>> {
        // literals in a grammar body skip on their own, only custom matchers need it done here
        let start = match (&rule.spec, rule.whitespace) {
            (RuleSpec::Custom(_), true) => self.whitespace.skip(input, self.source)?,
            _ => input,
        };

        match self.spec(&rule.spec, start)? {
            (Some(matched), rest) => {
                log::trace!("success: {}", rule.name);
                let token = name_token(matched, &rule.name);
                Ok((Some(Matched::named(token)), rest))
            }
            (None, _) => {
                log::trace!("failed: {}", rule.name);
                Ok((None, input))
            }
        }
    }

    fn spec(&self, spec: &RuleSpec, input: &'a str) -> Result<Step<'a>> {
        match spec {
            RuleSpec::Literal(text) => self.literal(text, input),
            RuleSpec::Reference(name) => {
                let rule = self
                    .registry
                    .lookup(name)
                    .ok_or_else(|| crate::Error::UnresolvedReference(name.to_string()))?;
                self.rule(rule, input)
            }
            RuleSpec::Sequence(items) => {
                let mut children = Vec::with_capacity(items.len());
                let mut rest = input;
                for item in items {
                    let (matched, next) = self.spec(item, rest)?;
                    let Some(matched) = matched else {
                        return Ok((None, input));
                    };
                    children.push(matched.token);
                    rest = next;
                }
                Ok((Some(Matched::anonymous(Token::node(SEQUENCE, children))), rest))
            }
            RuleSpec::Alternation(branches) => {
                for branch in branches {
                    let step = self.spec(branch, input)?;
                    if step.0.is_some() {
                        return Ok(step);
                    }
                }
                Ok((None, input))
            }
            RuleSpec::Custom(matcher) => match matcher.try_match(input) {
                (Some(token), rest) => match as_suffix(input, rest) {
                    Some(rest) => Ok((Some(Matched::named(token)), rest)),
                    None => {
                        log::warn!(
                            "custom `{}` match left a foreign string, treating it as failed",
                            token.token_type()
                        );
                        Ok((None, input))
                    }
                },
                (None, _) => Ok((None, input)),
            },
        }
    }

    fn literal(&self, text: &str, input: &'a str) -> Result<Step<'a>> {
        // an empty literal would match forever without consuming anything
        if text.is_empty() {
            return Ok((None, input));
        }

        let skipped = self.whitespace.skip(input, self.source)?;
        match skipped.strip_prefix(text) {
            Some(rest) => {
                log::trace!("success: literal {text:?}");
                Ok((Some(Matched::anonymous(Token::leaf(LITERAL, text))), rest))
            }
            None => {
                log::trace!("failed: literal {text:?}");
                Ok((None, input))
            }
        }
    }
}

/// Gives the token produced by a rule body the rule's name.
///
/// Tokens already carrying the name pass through, anonymous literal and sequence tokens are
/// relabelled, and tokens named after another rule get wrapped so their own type survives.
fn name_token(matched: Matched, name: &Rc<str>) -> Token {
    let Matched { token, named } = matched;
    if token.token_type() == &**name {
        token
    } else if named {
        Token::node(name.clone(), vec![token])
    } else {
        token.relabel(name.clone())
    }
}

/// Evaluates `spec` against `input` in one call.
pub fn evaluate<'a>(
    spec: &RuleSpec,
    input: &'a str,
    whitespace: &WhitespacePolicy,
    registry: &Registry,
) -> Result<MatchResult<'a>> {
    Evaluator::new(registry, whitespace, input).evaluate(spec, input)
}
