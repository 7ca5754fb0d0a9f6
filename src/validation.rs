//! Declarative field validation for drafts.
//!
//! A schema is an implementation of [`Validate`]: a pure function of the
//! draft that walks its fields through a [`Validator`]. Every field ends up
//! in the resulting [`Report`] with at most one active error, the first rule
//! that failed in declaration order.

use std::{collections::BTreeMap, fmt};

/// A value that can be checked against its business rules.
pub trait Validate {
    /// Records the outcome of every rule into `v`.
    fn validate_into(&self, v: &mut Validator<'_>);

    /// Runs the schema and returns the full report.
    fn validate(&self) -> Report {
        let mut report = Report::default();
        self.validate_into(&mut Validator::new(&mut report));
        report
    }
}

/// The rule that produced a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The field must not be empty.
    Required,
    /// The field must have at least this many characters.
    MinLength(usize),
    /// The field must have at most this many characters.
    MaxLength(usize),
    /// A named custom or cross-field rule.
    Custom(&'static str),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::MinLength(n) => write!(f, "min-length({n})"),
            Self::MaxLength(n) => write!(f, "max-length({n})"),
            Self::Custom(kind) => write!(f, "{kind}"),
        }
    }
}

/// The active error of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Which rule failed.
    pub rule: Rule,
    /// Message shown next to the field.
    pub message: String,
}

/// Per-field validation outcome.
///
/// Field paths use dots for nested values and brackets for list entries,
/// e.g. `image.imageUrl` or `chapters[0].text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    fields: BTreeMap<String, Option<FieldError>>,
}

impl Report {
    /// Whether every field passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fields.values().all(Option::is_none)
    }

    /// Whether the field at `path` was checked and passed.
    #[must_use]
    pub fn is_field_valid(&self, path: &str) -> bool {
        matches!(self.fields.get(path), Some(None))
    }

    /// The active error of the field at `path`, if any.
    #[must_use]
    pub fn error(&self, path: &str) -> Option<&FieldError> {
        self.fields.get(path).and_then(Option::as_ref)
    }

    /// All active errors keyed by field path, in path order.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.fields
            .iter()
            .filter_map(|(path, error)| error.as_ref().map(|e| (path.as_str(), e)))
    }

    /// Every checked field path.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, error) in self.errors() {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{path}: {}", error.message)?;
        }
        if first {
            write!(f, "valid")?;
        }
        Ok(())
    }
}

impl std::error::Error for Report {}

/// Walks the fields of a draft, recording rule outcomes into a [`Report`].
pub struct Validator<'r> {
    report: &'r mut Report,
    prefix: String,
}

impl<'r> Validator<'r> {
    fn new(report: &'r mut Report) -> Self {
        Self {
            report,
            prefix: String::new(),
        }
    }

    fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.prefix)
        }
    }

    /// Starts checking the field `name` holding `value`.
    pub fn field<'v>(&'v mut self, name: &str, value: &'v str) -> FieldCheck<'v> {
        let path = self.path(name);
        self.report.fields.entry(path.clone()).or_insert(None);
        FieldCheck {
            report: &mut *self.report,
            path,
            value,
        }
    }

    /// Applies `schema` with every field path prefixed by `name`.
    pub fn nested<T: Validate + ?Sized>(&mut self, name: &str, schema: &T) {
        let prefix = self.path(name);
        schema.validate_into(&mut Validator {
            report: &mut *self.report,
            prefix,
        });
    }

    /// Applies each item's schema under `name[index]`.
    pub fn each<'i, T, I>(&mut self, name: &str, items: I)
    where
        T: Validate + 'i,
        I: IntoIterator<Item = (usize, &'i T)>,
    {
        for (index, item) in items {
            self.nested(&format!("{name}[{index}]"), item);
        }
    }
}

/// The rules of a single field. Later rules are skipped once one fails.
pub struct FieldCheck<'v> {
    report: &'v mut Report,
    path: String,
    value: &'v str,
}

impl FieldCheck<'_> {
    fn fail(&mut self, rule: Rule, message: &str) {
        let Some(slot) = self.report.fields.get_mut(&self.path) else {
            return;
        };
        if slot.is_none() {
            *slot = Some(FieldError {
                rule,
                message: message.to_string(),
            });
        }
    }

    fn chars(&self) -> usize {
        self.value.chars().count()
    }

    /// The value must not be empty.
    pub fn required(mut self, message: &str) -> Self {
        if self.value.is_empty() {
            self.fail(Rule::Required, message);
        }
        self
    }

    /// The rich-text value must have visible content.
    pub fn required_rich_text(mut self, message: &str) -> Self {
        if crate::domain::rich_text::is_blank(self.value) {
            self.fail(Rule::Required, message);
        }
        self
    }

    /// A non-empty value must have at least `min` characters.
    pub fn min_len(mut self, min: usize, message: &str) -> Self {
        if !self.value.is_empty() && self.chars() < min {
            self.fail(Rule::MinLength(min), message);
        }
        self
    }

    /// The value must have at most `max` characters.
    pub fn max_len(mut self, max: usize, message: &str) -> Self {
        if self.chars() > max {
            self.fail(Rule::MaxLength(max), message);
        }
        self
    }

    /// A custom rule named `kind` that passes when `ok` holds.
    pub fn check(mut self, ok: bool, kind: &'static str, message: &str) -> Self {
        if !ok {
            self.fail(Rule::Custom(kind), message);
        }
        self
    }
}
