//! Declaration locations.
//!
//! Declarations have no source text, so diagnostics point at the declaring
//! entity instead of a byte span: `Recipe`, `Recipe.title`,
//! `RecipeResolver.recipe#0`.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The site of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    /// Declaring type or resolver class.
    pub owner: String,
    /// Field or method name, if the location is a member.
    pub member: Option<String>,
    /// Parameter index, if the location is a method parameter.
    pub index: Option<usize>,
}

impl Location {
    /// Creates a location pointing at a type.
    #[must_use]
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            member: None,
            index: None,
        }
    }

    /// Creates a location pointing at a member of a type.
    #[must_use]
    pub fn member(owner: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            member: Some(member.into()),
            index: None,
        }
    }

    /// Narrows the location to a parameter.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.owner)?;
        if let Some(member) = &self.member {
            write!(f, ".{member}")?;
        }
        if let Some(index) = self.index {
            write!(f, "#{index}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Location::owner("Recipe").to_string(), "Recipe");
        assert_eq!(Location::member("Recipe", "title").to_string(), "Recipe.title");
        assert_eq!(
            Location::member("RecipeResolver", "recipe")
                .with_index(0)
                .to_string(),
            "RecipeResolver.recipe#0"
        );
    }
}
