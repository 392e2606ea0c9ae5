//! Declarative field schemas.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s. Each spec holds the
//! rules for one field, evaluated in declared order; the first rule that fails
//! is the field's error and later rules are skipped.

use std::collections::BTreeSet;
use std::sync::Arc;

use gpui::SharedString;
use regex::Regex;

use super::controller::{FieldKey, FormController, FormErrors, FormResult};
use super::validation::{FieldLens, ValidationError};

/// The error a schema reports for a field: which rule failed and its message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuleViolation {
    pub rule: &'static str,
    pub message: SharedString,
}

impl ValidationError for RuleViolation {
    fn message(&self) -> SharedString {
        self.message.clone()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Text,
    Boolean,
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

#[derive(Clone)]
struct Rule<T> {
    name: &'static str,
    message: SharedString,
    passes: Predicate<T>,
}

/// The rules for a single field.
#[derive(Clone)]
pub struct FieldSpec<T> {
    key: FieldKey,
    kind: FieldKind,
    rules: Vec<Rule<T>>,
    depends_on: BTreeSet<FieldKey>,
}

impl<T: 'static> FieldSpec<T> {
    pub fn text<L>(lens: L) -> TextField<T, L>
    where
        L: FieldLens<T>,
        L::Value: AsRef<str>,
    {
        TextField {
            lens,
            spec: Self::empty(lens.key(), FieldKind::Text),
        }
    }

    pub fn boolean<L>(lens: L) -> BooleanField<T, L>
    where
        L: FieldLens<T, Value = bool>,
    {
        BooleanField {
            lens,
            spec: Self::empty(lens.key(), FieldKind::Boolean),
        }
    }

    fn empty(key: FieldKey, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            rules: Vec::new(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Other fields whose value this field's rules read.
    pub fn depends_on(&self) -> &BTreeSet<FieldKey> {
        &self.depends_on
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name)
    }

    pub fn is_required(&self) -> bool {
        self.rule_names()
            .any(|name| name == REQUIRED || name == MUST_BE_TRUE)
    }

    /// Evaluates the rules in order and stops at the first failure.
    pub fn check(&self, model: &T) -> Result<(), RuleViolation> {
        match self.rules.iter().find(|rule| !(rule.passes)(model)) {
            Some(rule) => Err(RuleViolation {
                rule: rule.name,
                message: rule.message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn push(&mut self, name: &'static str, message: SharedString, passes: Predicate<T>) {
        self.rules.push(Rule {
            name,
            message,
            passes,
        });
    }
}

const REQUIRED: &str = "required";
const MIN_LEN: &str = "min_len";
const MATCHES: &str = "matches";
const EQUALS: &str = "equals";
const MUST_BE_TRUE: &str = "must_be_true";

/// Builder for a string-valued field.
pub struct TextField<T, L> {
    lens: L,
    spec: FieldSpec<T>,
}

impl<T, L> TextField<T, L>
where
    T: 'static,
    L: FieldLens<T>,
    L::Value: AsRef<str>,
{
    /// Fails on the empty string. Whitespace counts as content.
    pub fn required(self, message: impl Into<SharedString>) -> Self {
        self.test(REQUIRED, message, |_, value| !value.is_empty())
    }

    /// Length in characters, not bytes.
    pub fn min_len(self, min: usize, message: impl Into<SharedString>) -> Self {
        self.test(MIN_LEN, message, move |_, value| value.chars().count() >= min)
    }

    pub fn matches(self, pattern: &'static Regex, message: impl Into<SharedString>) -> Self {
        self.test(MATCHES, message, move |_, value| pattern.is_match(value))
    }

    /// Must equal the current value of `other`; `other` becomes a dependency.
    pub fn equals<O>(mut self, other: O, message: impl Into<SharedString>) -> Self
    where
        O: FieldLens<T>,
        O::Value: AsRef<str>,
    {
        self.spec.depends_on.insert(other.key());
        self.test(EQUALS, message, move |model, value| {
            other.get(model).as_ref() == value
        })
    }

    pub fn test(
        mut self,
        name: &'static str,
        message: impl Into<SharedString>,
        predicate: impl Fn(&T, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        let lens = self.lens;
        self.spec.push(
            name,
            message.into(),
            Arc::new(move |model: &T| predicate(model, lens.get(model).as_ref())),
        );
        self
    }
}

impl<T, L> From<TextField<T, L>> for FieldSpec<T> {
    fn from(field: TextField<T, L>) -> Self {
        field.spec
    }
}

/// Builder for a checkbox-style field.
pub struct BooleanField<T, L> {
    lens: L,
    spec: FieldSpec<T>,
}

impl<T, L> BooleanField<T, L>
where
    T: 'static,
    L: FieldLens<T, Value = bool>,
{
    pub fn must_be_true(self, message: impl Into<SharedString>) -> Self {
        self.test(MUST_BE_TRUE, message, |_, value| value)
    }

    pub fn test(
        mut self,
        name: &'static str,
        message: impl Into<SharedString>,
        predicate: impl Fn(&T, bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        let lens = self.lens;
        self.spec.push(
            name,
            message.into(),
            Arc::new(move |model: &T| predicate(model, *lens.get(model))),
        );
        self
    }
}

impl<T, L> From<BooleanField<T, L>> for FieldSpec<T> {
    fn from(field: BooleanField<T, L>) -> Self {
        field.spec
    }
}

#[derive(Clone)]
pub struct Schema<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<T: 'static> Schema<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. A second spec for the same key replaces the first in place.
    pub fn field(mut self, field: impl Into<FieldSpec<T>>) -> Self {
        let field = field.into();
        match self.fields.iter_mut().find(|spec| spec.key == field.key) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    pub fn field_spec(&self, key: FieldKey) -> Option<&FieldSpec<T>> {
        self.fields.iter().find(|spec| spec.key == key)
    }

    /// The first failing rule of every invalid field. Empty means valid.
    pub fn validate(&self, values: &T) -> FormErrors<RuleViolation> {
        self.fields
            .iter()
            .filter_map(|spec| spec.check(values).err().map(|error| (spec.key, error)))
            .collect()
    }

    pub fn validate_field(&self, key: FieldKey, values: &T) -> Option<RuleViolation> {
        self.field_spec(key).and_then(|spec| spec.check(values).err())
    }

    pub fn is_valid(&self, values: &T) -> bool {
        self.fields.iter().all(|spec| spec.check(values).is_ok())
    }
}

impl<T> FormController<T, RuleViolation>
where
    T: Clone + Send + Sync + 'static,
{
    /// Registers one validator per schema field, along with the schema's
    /// dependencies, required flags and field order.
    pub fn register_schema(&self, schema: &Schema<T>) -> FormResult<()> {
        for spec in schema.fields() {
            let key = spec.key();
            let field = spec.clone();
            self.register_field_validator_by_key(
                key,
                Arc::new(move |model: &T| field.check(model)),
            )?;
            for source in spec.depends_on() {
                self.register_dependency_by_key(*source, key)?;
            }
            if spec.is_required() {
                self.register_required_key(key)?;
            }
            self.register_field_order(key)?;
        }
        tracing::debug!(fields = schema.fields().len(), "schema registered");

        if self.options.validate_on_mount {
            let _ = self.validate_form()?;
        }
        Ok(())
    }
}
