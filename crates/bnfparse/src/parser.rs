//! The public parser: a rule registry plus the whitespace policy it is evaluated with.

use serde::Deserialize;

use crate::{
    eval::Evaluator,
    grammar::{self, RuleDef},
    offset_of, Error, GrammarErrorKind, MatchResult, Registry, Result, RuleHandle, RuleOptions,
    RuleSpec, Token, WhitespaceConfig, WhitespacePolicy,
};

/// Parser settings as they may be loaded from a file.
///
/// ```json
/// { "whitespace": { "policy": "require", "phrase": " " }, "main": "programme" }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Shorthand for the `ignore` policy.
    pub ignore_whitespace: bool,
    /// Takes precedence over `ignore_whitespace`.
    pub whitespace: Option<WhitespaceConfig>,
    /// Name of the start rule. It becomes the start rule when a rule of that name is registered.
    pub main: Option<String>,
}

impl ParserConfig {
    pub fn from_json(json: &str) -> serde_json::Result<ParserConfig> {
        serde_json::from_str(json)
    }

    pub fn whitespace_policy(&self) -> WhitespacePolicy {
        match &self.whitespace {
            Some(config) => config.clone().into(),
            None if self.ignore_whitespace => WhitespacePolicy::Ignore,
            None => WhitespacePolicy::Keep,
        }
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct ParseOptions<'a> {
    /// Start from this rule instead of the parser's start rule.
    pub main: Option<&'a str>,
    /// Succeed even when input remains after the start rule matched.
    pub allow_partial: bool,
}

#[derive(Default)]
pub struct Parser {
    registry: Registry,
    whitespace: WhitespacePolicy,
    /// Start rule requested by the configuration, applied once it is registered.
    configured_main: Option<String>,
}

impl Parser {
    pub fn new() -> Parser {
        Parser::default()
    }

    pub fn with_whitespace(whitespace: WhitespacePolicy) -> Parser {
        Parser {
            whitespace,
            ..Parser::default()
        }
    }

    pub fn with_config(config: ParserConfig) -> Parser {
        Parser {
            whitespace: config.whitespace_policy(),
            configured_main: config.main,
            ..Parser::default()
        }
    }

    pub fn whitespace(&self) -> &WhitespacePolicy {
        &self.whitespace
    }

    pub fn set_whitespace(&mut self, whitespace: WhitespacePolicy) {
        self.whitespace = whitespace;
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Registers a rule whose body is written in grammar syntax, `body` being everything to the
    /// right of `:=`.
    pub fn new_rule(&mut self, name: &str, body: &str) -> Result<RuleHandle> {
        self.new_rule_with(name, body, RuleOptions::default())
    }

    pub fn new_rule_with(
        &mut self,
        name: &str,
        body: &str,
        options: RuleOptions,
    ) -> Result<RuleHandle> {
        let grammar_error = |kind| Error::Grammar { line: 1, kind };
        if !grammar::is_rule_name(name) {
            return Err(grammar_error(GrammarErrorKind::InvalidName));
        }
        let spec = grammar::compile_body(body).map_err(grammar_error)?;
        self.add_rule(name, spec, options)
    }

    /// Registers an already built rule body.
    pub fn add_rule(
        &mut self,
        name: &str,
        spec: RuleSpec,
        options: RuleOptions,
    ) -> Result<RuleHandle> {
        let options = match self.configured_main.as_deref() == Some(name) {
            true => options.main(),
            false => options,
        };
        self.registry.insert(name, spec, options)
    }

    /// Registers a function as a rule. The function is called with the input as is, unless
    /// it opts into the whitespace policy with [`RuleOptions::whitespace`].
    pub fn from_function<F>(&mut self, name: &str, fun: F) -> Result<RuleHandle>
    where
        F: for<'a> Fn(&'a str) -> MatchResult<'a> + 'static,
    {
        self.from_function_with(name, fun, RuleOptions::default())
    }

    pub fn from_function_with<F>(
        &mut self,
        name: &str,
        fun: F,
        options: RuleOptions,
    ) -> Result<RuleHandle>
    where
        F: for<'a> Fn(&'a str) -> MatchResult<'a> + 'static,
    {
        self.add_rule(name, RuleSpec::custom(fun), options)
    }

    /// Registers every rule of a grammar block.
    ///
    /// Nothing is registered unless the whole block compiles and none of its names is already
    /// taken.
    pub fn grammar(&mut self, text: &str) -> Result<Vec<RuleHandle>> {
        let defs = grammar::compile(text)?;
        self.register_block(defs)
    }

    /// Registers a grammar block whose rules are separated by `delimiter` rather than by
    /// newlines.
    pub fn grammar_delimited(
        &mut self,
        text: &str,
        delimiter: &str,
    ) -> Result<Vec<RuleHandle>> {
        let defs = grammar::compile_delimited(text, delimiter)?;
        self.register_block(defs)
    }

    fn register_block(&mut self, defs: Vec<RuleDef>) -> Result<Vec<RuleHandle>> {
        if let Some(def) = defs.iter().find(|d| self.registry.contains(&d.name)) {
            return Err(Error::DuplicateRule(def.name.to_string()));
        }

        let mut handles = Vec::with_capacity(defs.len());
        for RuleDef { name, spec, .. } in defs {
            handles.push(self.add_rule(&name, spec, RuleOptions::default())?);
        }
        Ok(handles)
    }

    pub fn set_main(&mut self, name: &str) -> Result<()> {
        self.registry.set_main(name)
    }

    pub fn parse(&self, input: &str) -> Result<Token> {
        self.parse_with(input, ParseOptions::default())
    }

    pub fn parse_with(&self, input: &str, options: ParseOptions) -> Result<Token> {
        let rule = self.registry.entry(options.main)?;
        log::debug!("parsing {} bytes starting from `{}`", input.len(), rule.name);

        let evaluator = Evaluator::new(&self.registry, &self.whitespace, input);
        let (token, rest) = evaluator.evaluate_rule(rule, input)?;

        let Some(token) = token else {
            return Err(Error::NotFound {
                input: input.to_owned(),
            });
        };
        if !rest.is_empty() && !options.allow_partial {
            return Err(Error::Incomplete {
                position: offset_of(input, rest),
                remaining: rest.to_owned(),
            });
        }
        Ok(token)
    }
}
