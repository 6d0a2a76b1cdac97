//! Handling of the text between tokens.
//!
//! A policy runs immediately before every literal attempt (and before custom rules that opt in)
//! and returns the input with its leading separator removed. Skipped text never ends up in a
//! token.

use std::{fmt, rc::Rc};

use serde::Deserialize;

use crate::{as_suffix, offset_of, Error, Result};

#[derive(Clone, Default)]
pub enum WhitespacePolicy {
    /// Whitespace is ordinary input.
    #[default]
    Keep,
    /// Strip all leading whitespace.
    Ignore,
    /// Strip leading characters drawn from the set.
    IgnoreSpecific(Rc<str>),
    /// Demand `phrase` between tokens, failing with [`Error::Delimiter`] when it is absent.
    /// With `ignore` any whitespace after the phrase is stripped as well.
    ///
    /// The phrase is only demanded between tokens: nothing is required at the very start or
    /// the very end of the input.
    Require { phrase: Rc<str>, ignore: bool },
    Custom(Rc<dyn Fn(&str) -> &str>),
}

impl WhitespacePolicy {
    pub fn ignore_specific(chars: impl Into<Rc<str>>) -> WhitespacePolicy {
        WhitespacePolicy::IgnoreSpecific(chars.into())
    }

    pub fn require(phrase: impl Into<Rc<str>>, ignore: bool) -> WhitespacePolicy {
        WhitespacePolicy::Require {
            phrase: phrase.into(),
            ignore,
        }
    }

    /// The returned string must be a suffix of the argument.
    pub fn custom<F>(fun: F) -> WhitespacePolicy
    where
        F: for<'a> Fn(&'a str) -> &'a str + 'static,
    {
        WhitespacePolicy::Custom(Rc::new(fun))
    }

    pub fn one_space() -> WhitespacePolicy {
        Self::require(" ", false)
    }

    pub fn one_space_or_more() -> WhitespacePolicy {
        Self::require(" ", true)
    }

    pub fn ignore_spaces() -> WhitespacePolicy {
        Self::ignore_specific(" ")
    }

    /// Applies the policy to `input`, a suffix of the `source` being parsed.
    pub fn skip<'a>(&self, input: &'a str, source: &str) -> Result<&'a str> {
        let skipped = match self {
            WhitespacePolicy::Keep => input,
            WhitespacePolicy::Ignore => input.trim_start(),
            WhitespacePolicy::IgnoreSpecific(chars) => {
                input.trim_start_matches(|c: char| chars.contains(c))
            }
            WhitespacePolicy::Require { phrase, ignore } => {
                let at_boundary = input.len() < source.len() && !input.is_empty();
                if !at_boundary {
                    return Ok(input);
                }
                match input.strip_prefix(&**phrase) {
                    Some(rest) if *ignore => rest.trim_start(),
                    Some(rest) => rest,
                    None => {
                        return Err(Error::Delimiter {
                            position: offset_of(source, input),
                            phrase: phrase.to_string(),
                        })
                    }
                }
            }
            WhitespacePolicy::Custom(fun) => match as_suffix(input, fun(input)) {
                Some(rest) => rest,
                None => {
                    log::warn!("whitespace policy returned a foreign string, skipping nothing");
                    input
                }
            },
        };
        Ok(skipped)
    }
}

impl fmt::Debug for WhitespacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("Keep"),
            Self::Ignore => f.write_str("Ignore"),
            Self::IgnoreSpecific(chars) => f.debug_tuple("IgnoreSpecific").field(chars).finish(),
            Self::Require { phrase, ignore } => f
                .debug_struct("Require")
                .field("phrase", phrase)
                .field("ignore", ignore)
                .finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Serializable description of a built-in policy, as found in a parser configuration.
///
/// ```json
/// { "policy": "require", "phrase": " ", "ignore": true }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum WhitespaceConfig {
    None,
    Ignore,
    IgnoreSpecific {
        chars: String,
    },
    Require {
        phrase: String,
        #[serde(default)]
        ignore: bool,
    },
}

impl From<WhitespaceConfig> for WhitespacePolicy {
    fn from(value: WhitespaceConfig) -> Self {
        match value {
            WhitespaceConfig::None => WhitespacePolicy::Keep,
            WhitespaceConfig::Ignore => WhitespacePolicy::Ignore,
            WhitespaceConfig::IgnoreSpecific { chars } => WhitespacePolicy::ignore_specific(chars),
            WhitespaceConfig::Require { phrase, ignore } => {
                WhitespacePolicy::require(phrase, ignore)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "a \t b";

    fn rest(policy: &WhitespacePolicy, input: &str) -> String {
        // pretend one byte was consumed already so that `input` sits between tokens
        let source = format!("x{input}");
        policy.skip(&source[1..], &source).unwrap().to_owned()
    }

    #[test]
    fn keep_and_ignore() {
        assert_eq!(rest(&WhitespacePolicy::Keep, " \tb"), " \tb");
        assert_eq!(rest(&WhitespacePolicy::Ignore, " \t\nb "), "b ");
        assert_eq!(rest(&WhitespacePolicy::Ignore, "b"), "b");
    }

    #[test]
    fn ignore_specific_characters() {
        let policy = WhitespacePolicy::ignore_spaces();
        assert_eq!(rest(&policy, "   b"), "b");
        assert_eq!(rest(&policy, "  \tb"), "\tb");
        let policy = WhitespacePolicy::ignore_specific(" \t");
        assert_eq!(rest(&policy, "  \tb"), "b");
    }

    #[test]
    fn require_phrase() {
        let policy = WhitespacePolicy::one_space();
        assert_eq!(rest(&policy, " b"), "b");
        assert_eq!(rest(&policy, "  b"), " b");

        let source = "ab";
        let err = policy.skip(&source[1..], source).unwrap_err();
        assert!(matches!(err, Error::Delimiter { position: 1, ref phrase } if phrase == " "));

        let policy = WhitespacePolicy::one_space_or_more();
        assert_eq!(rest(&policy, "   b"), "b");
        assert!(policy.skip(&source[1..], source).is_err());
    }

    #[test]
    fn require_only_between_tokens() {
        let policy = WhitespacePolicy::one_space();
        // start of input
        assert_eq!(policy.skip(SOURCE, SOURCE).unwrap(), SOURCE);
        // end of input
        assert_eq!(policy.skip(&SOURCE[SOURCE.len()..], SOURCE).unwrap(), "");
    }

    #[test]
    fn custom_policy() {
        let policy = WhitespacePolicy::custom(|s| s.trim_start_matches('_'));
        assert_eq!(rest(&policy, "__b_"), "b_");
    }

    #[test]
    fn custom_policy_must_return_a_suffix() {
        let policy = WhitespacePolicy::custom(|_| "zzz");
        assert_eq!(rest(&policy, "  b"), "  b");
        let policy = WhitespacePolicy::custom(|_| "");
        assert_eq!(rest(&policy, "  b"), "");
    }

    #[test]
    fn deserialize_config() {
        let config: WhitespaceConfig =
            serde_json::from_str(r#"{ "policy": "require", "phrase": " " }"#).unwrap();
        assert_eq!(
            config,
            WhitespaceConfig::Require {
                phrase: " ".into(),
                ignore: false
            }
        );
        let config: WhitespaceConfig =
            serde_json::from_str(r#"{ "policy": "ignore_specific", "chars": " \t" }"#).unwrap();
        let policy = WhitespacePolicy::from(config);
        assert_eq!(rest(&policy, "\t b"), "b");
        assert!(serde_json::from_str::<WhitespaceConfig>(r#"{ "policy": "sometimes" }"#).is_err());
    }
}
