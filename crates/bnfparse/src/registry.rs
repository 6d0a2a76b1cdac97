//! The table of named rules owned by a parser.
//!
//! Rules refer to each other by name only, so the rule graph may contain cycles without the
//! specs ever pointing at each other directly; names are resolved against this table when a
//! rule is evaluated.

use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    fmt,
    rc::Rc,
};

use cranelift_entity::{entity_impl, PrimaryMap};

use crate::{Error, Result, RuleOptions, RuleSpec};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleHandle(u32);

entity_impl! { RuleHandle }

#[derive(Clone, Debug)]
pub struct Rule {
    pub name: Rc<str>,
    pub spec: RuleSpec,
    /// Run the whitespace policy before evaluating `spec`. Only honoured for custom bodies.
    pub whitespace: bool,
}

pub struct Registry {
    rules: PrimaryMap<RuleHandle, Rule>,
    name_to_rule: HashMap<Rc<str>, RuleHandle>,
    main: Option<RuleHandle>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            rules: PrimaryMap::new(),
            name_to_rule: HashMap::new(),
            main: None,
        }
    }

    /// Registers `spec` under `name`.
    ///
    /// An existing name is only replaced with `options.force`, keeping its handle. The first
    /// rule registered becomes the start rule unless another one asks for it with
    /// `options.main`.
    pub fn insert(
        &mut self,
        name: impl Into<Rc<str>>,
        spec: RuleSpec,
        options: RuleOptions,
    ) -> Result<RuleHandle> {
        let name = name.into();
        let rule = Rule {
            name: name.clone(),
            spec,
            whitespace: options.whitespace,
        };

        let handle = match self.name_to_rule.entry(name) {
            Entry::Occupied(o) => {
                if !options.force {
                    return Err(Error::DuplicateRule(o.key().to_string()));
                }
                let handle = *o.get();
                log::debug!("redefining rule `{}`", rule.name);
                self.rules[handle] = rule;
                handle
            }
            Entry::Vacant(v) => {
                log::debug!("defining rule `{}`", rule.name);
                let handle = self.rules.push(rule);
                v.insert(handle);
                handle
            }
        };

        if options.main || self.main.is_none() {
            self.main = Some(handle);
        }
        Ok(handle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_rule.contains_key(name)
    }

    pub fn handle(&self, name: &str) -> Option<RuleHandle> {
        self.name_to_rule.get(name).copied()
    }

    pub fn get(&self, handle: RuleHandle) -> Option<&Rule> {
        self.rules.get(handle)
    }

    pub fn lookup(&self, name: &str) -> Option<&Rule> {
        self.get(self.handle(name)?)
    }

    pub fn main(&self) -> Option<&Rule> {
        self.get(self.main?)
    }

    pub fn set_main(&mut self, name: &str) -> Result<()> {
        let handle = self
            .handle(name)
            .ok_or_else(|| Error::UnknownEntryPoint(name.to_owned()))?;
        self.main = Some(handle);
        Ok(())
    }

    pub(crate) fn main_handle(&self) -> Option<RuleHandle> {
        self.main
    }

    pub(crate) fn restore_main(&mut self, main: Option<RuleHandle>) {
        self.main = main;
    }

    /// The rule a parse starts from: `name` when given, the start rule otherwise.
    pub fn entry(&self, name: Option<&str>) -> Result<&Rule> {
        match name {
            Some(name) => self
                .lookup(name)
                .ok_or_else(|| Error::UnknownEntryPoint(name.to_owned())),
            None => self.main().ok_or(Error::NoEntryPoint),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> cranelift_entity::Iter<'_, RuleHandle, Rule> {
        self.rules.iter()
    }

    /// Names referenced by some rule but not defined, each reported once.
    pub fn undefined_references(&self) -> Vec<Rc<str>> {
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for (_, rule) in self.iter() {
            for name in rule.spec.references() {
                if !self.contains(&name) && seen.insert(name.clone()) {
                    missing.push(name);
                }
            }
        }
        missing
    }

    pub fn display_into(&self, buf: &mut dyn fmt::Write) -> fmt::Result {
        for (_, rule) in self.iter() {
            writeln!(buf, "{} := {}", rule.name, rule.spec)?;
        }
        Ok(())
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_into(f)
    }
}
