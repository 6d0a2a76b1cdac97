use std::{fmt, rc::Rc};

use crate::Token;

/// What every matcher returns: the token it produced, if any, and the input left after it.
/// On failure the remaining input is the input the matcher was given.
pub type MatchResult<'a> = (Option<Token>, &'a str);

/// The uniform rule contract.
///
/// Implemented for every `Fn(&str) -> (Option<Token>, &str)`, so plain functions and closures
/// can be registered as rules and referenced by name like grammar-derived ones.
pub trait Matcher {
    fn try_match<'a>(&self, input: &'a str) -> MatchResult<'a>;
}

impl<F> Matcher for F
where
    F: for<'a> Fn(&'a str) -> MatchResult<'a>,
{
    fn try_match<'a>(&self, input: &'a str) -> MatchResult<'a> {
        self(input)
    }
}

/// Compiled form of a rule body.
#[derive(Clone)]
pub enum RuleSpec {
    Literal(Rc<str>),
    /// Resolved by name when evaluated, so it may point forward or back at its own rule.
    Reference(Rc<str>),
    Sequence(Vec<RuleSpec>),
    /// Ordered choice, the first branch that matches wins.
    Alternation(Vec<RuleSpec>),
    Custom(Rc<dyn Matcher>),
}

impl RuleSpec {
    pub fn literal(text: impl Into<Rc<str>>) -> RuleSpec {
        RuleSpec::Literal(text.into())
    }

    pub fn reference(name: impl Into<Rc<str>>) -> RuleSpec {
        RuleSpec::Reference(name.into())
    }

    /// Wraps a function or closure. Closures passed here directly get their lifetimes inferred
    /// from the bound, which a plain `impl Matcher` argument cannot do.
    pub fn custom<F>(fun: F) -> RuleSpec
    where
        F: for<'a> Fn(&'a str) -> MatchResult<'a> + 'static,
    {
        RuleSpec::Custom(Rc::new(fun))
    }

    pub fn from_matcher(matcher: impl Matcher + 'static) -> RuleSpec {
        RuleSpec::Custom(Rc::new(matcher))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    pub fn is_alternation(&self) -> bool {
        matches!(self, Self::Alternation(_))
    }

    pub fn visit(&self, fun: &mut dyn FnMut(&RuleSpec)) {
        fun(self);
        match self {
            RuleSpec::Sequence(vec) | RuleSpec::Alternation(vec) => {
                for a in vec {
                    a.visit(fun);
                }
            }
            _ => {}
        }
    }

    /// Names referenced anywhere in this rule body, in order of appearance, duplicates included.
    pub fn references(&self) -> Vec<Rc<str>> {
        let mut names = Vec::new();
        self.visit(&mut |spec| {
            if let RuleSpec::Reference(name) = spec {
                names.push(name.clone());
            }
        });
        names
    }

    fn display_into(&self, buf: &mut dyn fmt::Write, nested: bool) -> fmt::Result {
        match self {
            RuleSpec::Literal(text) => write!(buf, "{text:?}"),
            RuleSpec::Reference(name) => buf.write_str(name),
            RuleSpec::Custom(_) => buf.write_str("<custom>"),
            RuleSpec::Sequence(vec) if vec.is_empty() => buf.write_str("<empty>"),
            RuleSpec::Sequence(vec) | RuleSpec::Alternation(vec) => {
                let separator = match self.is_sequence() {
                    true => " ",
                    false => " | ",
                };
                if nested {
                    buf.write_char('(')?;
                }
                for (i, spec) in vec.iter().enumerate() {
                    if i > 0 {
                        buf.write_str(separator)?;
                    }
                    // a sequence inside an alternation needs no parentheses
                    let nested = !(self.is_alternation() && spec.is_sequence());
                    spec.display_into(buf, nested)?;
                }
                if nested {
                    buf.write_char(')')?;
                }
                Ok(())
            }
        }
    }
}

/// Renders the rule body back in grammar syntax; nesting the text syntax cannot express is
/// parenthesized.
impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_into(f, false)
    }
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            RuleSpec::Reference(name) => f.debug_tuple("Reference").field(name).finish(),
            RuleSpec::Sequence(vec) => f.debug_tuple("Sequence").field(vec).finish(),
            RuleSpec::Alternation(vec) => f.debug_tuple("Alternation").field(vec).finish(),
            RuleSpec::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Options applied when registering a rule.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct RuleOptions {
    /// Make this rule the start rule.
    pub main: bool,
    /// Allow replacing a rule registered under the same name.
    pub force: bool,
    /// Run the whitespace policy before a custom rule. Ignored for grammar bodies, whose
    /// literals always apply the policy themselves.
    pub whitespace: bool,
}

impl RuleOptions {
    pub const fn main(mut self) -> Self {
        self.main = true;
        self
    }
    pub const fn force(mut self) -> Self {
        self.force = true;
        self
    }
    pub const fn whitespace(mut self) -> Self {
        self.whitespace = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: Vec<RuleSpec>) -> RuleSpec {
        RuleSpec::Sequence(items)
    }

    #[test]
    fn display_as_grammar() {
        let spec = RuleSpec::Alternation(vec![
            seq(vec![RuleSpec::reference("alpha"), RuleSpec::reference("word")]),
            RuleSpec::reference("alpha"),
        ]);
        assert_eq!(spec.to_string(), "alpha word | alpha");

        let spec = seq(vec![
            RuleSpec::literal("a"),
            RuleSpec::Alternation(vec![RuleSpec::literal("b"), RuleSpec::literal("c")]),
            seq(Vec::new()),
        ]);
        assert_eq!(spec.to_string(), r#""a" ("b" | "c") <empty>"#);
    }

    #[test]
    fn collect_references() {
        let spec = RuleSpec::Alternation(vec![
            seq(vec![RuleSpec::reference("digit"), RuleSpec::reference("number")]),
            RuleSpec::reference("digit"),
            RuleSpec::literal("digit"),
        ]);
        let names = spec.references();
        let names = names.iter().map(|n| &**n).collect::<Vec<_>>();
        assert_eq!(names, ["digit", "number", "digit"]);
    }

    #[test]
    fn closures_are_matchers() {
        let spec = RuleSpec::custom(|input| match input.strip_prefix('x') {
            Some(rest) => (Some(Token::leaf("x", "x")), rest),
            None => (None, input),
        });
        let RuleSpec::Custom(matcher) = spec else {
            unreachable!()
        };
        let (token, rest) = matcher.try_match("xy");
        assert_eq!(token.unwrap().value(), "x");
        assert_eq!(rest, "y");
        assert!(matcher.try_match("y").0.is_none());
    }

    /// Matches a fixed keyword typed after itself.
    struct Keyword(&'static str);

    impl Matcher for Keyword {
        fn try_match<'a>(&self, input: &'a str) -> MatchResult<'a> {
            match input.strip_prefix(self.0) {
                Some(rest) => (Some(Token::leaf(self.0, self.0)), rest),
                None => (None, input),
            }
        }
    }

    #[test]
    fn struct_matchers() {
        let spec = RuleSpec::from_matcher(Keyword("let"));
        assert_eq!(spec.to_string(), "<custom>");
        let RuleSpec::Custom(matcher) = spec else {
            unreachable!()
        };
        let (token, rest) = matcher.try_match("let x");
        assert_eq!(token.unwrap().token_type(), "let");
        assert_eq!(rest, " x");
        assert_eq!(matcher.try_match("lex").1, "lex");
    }
}
