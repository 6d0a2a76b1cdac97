use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("grammar line {line}: {kind}")]
    Grammar { line: usize, kind: GrammarErrorKind },
    #[error("cannot redefine rule `{0}` without forcing")]
    DuplicateRule(String),
    #[error("reference to undefined rule `{0}`")]
    UnresolvedReference(String),
    #[error("no entry point specified")]
    NoEntryPoint,
    #[error("entry point `{0}` does not exist")]
    UnknownEntryPoint(String),
    #[error("{input:?} not valid")]
    NotFound { input: String },
    #[error("characters {remaining:?} remaining at offset {position}")]
    Incomplete { position: usize, remaining: String },
    #[error("expected delimiter {phrase:?} at offset {position}")]
    Delimiter { position: usize, phrase: String },
}

impl Error {
    /// Whether the error comes from the input rather than from the grammar or its setup.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::Incomplete { .. } | Error::Delimiter { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarErrorKind {
    #[error("missing `:=` separator")]
    MissingSeparator,
    #[error("rule name must be an identifier")]
    InvalidName,
    #[error("empty rule body")]
    EmptyBody,
    #[error("empty alternative around `|`")]
    EmptyAlternative,
    #[error("unterminated literal")]
    UnterminatedLiteral,
    #[error("empty literal")]
    EmptyLiteral,
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
    #[error("rule `{0}` defined more than once")]
    DuplicateRule(String),
}

#[test]
fn parse_failures_are_told_apart() {
    assert!(Error::NotFound { input: "x".into() }.is_parse_failure());
    assert!(Error::Delimiter {
        position: 1,
        phrase: " ".into()
    }
    .is_parse_failure());
    assert!(!Error::UnresolvedReference("x".into()).is_parse_failure());
    assert!(!Error::Grammar {
        line: 1,
        kind: GrammarErrorKind::EmptyBody
    }
    .is_parse_failure());
}
