//! The draft holder behind every edit screen.

use std::collections::BTreeSet;

use crate::validation::{FieldError, Report, Validate};

/// An editable draft with its live validation report.
///
/// The report is recomputed after every mutation, so it always describes
/// the current draft. Errors of a field become visible once the field was
/// touched or a submit was attempted.
#[derive(Debug, Clone)]
pub struct Form<T> {
    draft: T,
    baseline: T,
    report: Report,
    touched: BTreeSet<String>,
    submitted: bool,
}

impl<T: Validate + Clone> Form<T> {
    /// A form editing `draft`.
    #[must_use]
    pub fn new(draft: T) -> Self {
        let report = draft.validate();
        Self {
            baseline: draft.clone(),
            draft,
            report,
            touched: BTreeSet::new(),
            submitted: false,
        }
    }

    /// The current draft.
    pub const fn draft(&self) -> &T {
        &self.draft
    }

    /// Mutates the draft and re-validates it.
    pub fn edit(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.draft);
        self.revalidate();
    }

    /// Replaces the draft and makes it the new baseline, e.g. when another
    /// entity was selected.
    pub fn set(&mut self, draft: T) {
        self.baseline = draft.clone();
        self.draft = draft;
        self.touched.clear();
        self.submitted = false;
        self.revalidate();
    }

    /// Discards every edit since the last [`Form::new`] or [`Form::set`].
    pub fn reset(&mut self) {
        self.draft = self.baseline.clone();
        self.touched.clear();
        self.submitted = false;
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.report = self.draft.validate();
    }

    /// Marks a field as visited.
    pub fn touch(&mut self, path: impl Into<String>) {
        self.touched.insert(path.into());
    }

    /// Whether the field at `path` was visited.
    #[must_use]
    pub fn is_touched(&self, path: &str) -> bool {
        self.touched.contains(path)
    }

    /// The report of the current draft.
    pub const fn report(&self) -> &Report {
        &self.report
    }

    /// Whether the current draft passes every rule.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }

    /// The active error of a field, whether or not it is visible yet.
    #[must_use]
    pub fn error(&self, path: &str) -> Option<&FieldError> {
        self.report.error(path)
    }

    /// The error to show next to a field: only once the field was touched
    /// or a submit was attempted.
    #[must_use]
    pub fn visible_error(&self, path: &str) -> Option<&FieldError> {
        if self.submitted || self.is_touched(path) {
            self.error(path)
        } else {
            None
        }
    }

    /// Hands out the draft if it is valid.
    ///
    /// # Errors
    ///
    /// Returns the report when any field is invalid; every error becomes
    /// visible.
    pub fn submit(&mut self) -> Result<T, Report> {
        self.submitted = true;
        if self.report.is_valid() {
            Ok(self.draft.clone())
        } else {
            tracing::debug!(errors = %self.report, "Submit rejected");
            Err(self.report.clone())
        }
    }
}
