use crate::{
    domain::DocumentId,
    validation::{Validate, Validator},
};

/// A category that news items and articles are filed under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    /// Store id, `None` until created.
    pub id: Option<DocumentId>,
    /// Display name.
    pub name: String,
}

impl Category {
    /// A new, unsaved category.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

const NAME_LENGTH: &str = "The name of a category has a length between 5 and 25 characters";

impl Validate for Category {
    fn validate_into(&self, v: &mut Validator<'_>) {
        v.field("name", &self.name)
            .required("A category must have a name")
            .min_len(5, NAME_LENGTH)
            .max_len(25, NAME_LENGTH);
    }
}
