//! A small recursive-descent parser generator.
//!
//! Grammars are written as `name := body` lines or built rule by rule, compiled into
//! [`RuleSpec`]s stored in a [`Registry`] and evaluated against an input string with ordered
//! choice semantics. A successful parse produces a [`Token`] tree.
//!
//! ```ignore
//! let mut parser = Parser::with_whitespace(WhitespacePolicy::Ignore);
//! parser.grammar(r#"
//!     sentence := object verb object end
//!     end      := "." | "?" | "!"
//!     object   := "Jane" | "Tom" | "Rajesh"
//!     verb     := "liked" | "killed" | "voted for"
//! "#)?;
//! let root = parser.parse("Jane liked Rajesh .")?;
//! assert_eq!(root.series_str(), ["Jane", "liked", "Rajesh", "."]);
//! ```

pub mod common;
pub mod error;
pub mod eval;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod rule;
pub mod token;
pub mod whitespace;

use std::ops::Index;

pub use error::{Error, GrammarErrorKind, Result};
pub use parser::{ParseOptions, Parser, ParserConfig};
pub use registry::{Registry, Rule, RuleHandle};
pub use rule::{MatchResult, Matcher, RuleOptions, RuleSpec};
pub use token::Token;
pub use whitespace::{WhitespaceConfig, WhitespacePolicy};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct StrSpan {
    pub start: u32,
    pub end: u32,
}

impl StrSpan {
    #[inline]
    pub fn as_str(self, src: &str) -> &str {
        &src[self.start as usize..self.end as usize]
    }
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }
}

impl Index<StrSpan> for str {
    type Output = str;
    fn index(&self, index: StrSpan) -> &Self::Output {
        &self[index.start as usize..index.end as usize]
    }
}

/// Byte offset of `rest` inside `source`, `rest` being a suffix of it.
#[inline]
pub(crate) fn offset_of(source: &str, rest: &str) -> usize {
    source.len() - rest.len()
}

/// `rest` re-sliced out of `input`, or `None` when it is not a suffix of it. User callbacks may
/// hand back any string, this keeps the rest of the evaluator working on real suffixes.
pub(crate) fn as_suffix<'a>(input: &'a str, rest: &str) -> Option<&'a str> {
    input
        .ends_with(rest)
        .then(|| &input[offset_of(input, rest)..])
}
