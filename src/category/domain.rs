//! Core category domain types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ValidationError, database_id::CategoryId};

/// The colour given to categories created without one.
pub const DEFAULT_COLOUR: &str = "#ffffff";

/// A label for grouping transactions (e.g., 'Groceries', 'Salary').
///
/// Categories are metadata only, they never affect account balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name, unique across categories.
    pub name: String,
    /// A hex colour of the form `#rrggbb`.
    pub colour: String,
    /// Whether the category is still offered for new transactions.
    pub active: bool,
    /// When the category was created.
    pub created_at: OffsetDateTime,
    /// When the category was last modified.
    pub updated_at: OffsetDateTime,
}

/// The user editable fields of a [Category].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDetails {
    /// The display name.
    pub name: String,
    /// A hex colour, [DEFAULT_COLOUR] when empty.
    #[serde(default)]
    pub colour: String,
    /// Whether the category is active.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CategoryDetails {
    /// Details for an active category named `name` with the default colour.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            colour: String::new(),
            active: true,
        }
    }

    /// Set the colour.
    pub fn colour(mut self, colour: &str) -> Self {
        self.colour = colour.to_owned();
        self
    }

    /// Set the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Check the details and return the colour to store.
    ///
    /// # Errors
    /// Returns [ValidationError::EmptyCategoryName] if the name is blank and
    /// [ValidationError::InvalidCategoryColour] if the colour is not `#rrggbb`.
    pub(crate) fn validate(&self) -> Result<String, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }

        parse_colour(&self.colour)
    }
}

/// Normalise a hex colour to lowercase `#rrggbb`.
fn parse_colour(colour: &str) -> Result<String, ValidationError> {
    let colour = colour.trim();
    if colour.is_empty() {
        return Ok(DEFAULT_COLOUR.to_owned());
    }

    match colour.strip_prefix('#') {
        Some(digits) if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
            Ok(colour.to_ascii_lowercase())
        }
        _ => Err(ValidationError::InvalidCategoryColour(colour.to_owned())),
    }
}
