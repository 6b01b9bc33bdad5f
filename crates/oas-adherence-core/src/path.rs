//! `$`-rooted locators into a value tree
//!
//! Generators extend paths per schema step (`.key`, `[]`); the validator
//! extends them per value step (`.key`, `[i]`). [`JsonPath::normalized`]
//! erases element indices so both spellings compare equal for the same
//! logical location.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A locator string such as `$.owner.pets[].name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPath(String);

impl JsonPath {
    /// The root locator `$`
    pub fn root() -> Self {
        JsonPath("$".to_string())
    }

    /// Member access step
    pub fn key(&self, name: &str) -> Self {
        JsonPath(format!("{}.{}", self.0, name))
    }

    /// Schema-level element step (any element)
    pub fn items(&self) -> Self {
        JsonPath(format!("{}[]", self.0))
    }

    /// Value-level element step
    pub fn index(&self, index: usize) -> Self {
        JsonPath(format!("{}[{}]", self.0, index))
    }

    /// Rewrite every `[i]` step to `[]`
    pub fn normalized(&self) -> Self {
        let mut out = String::with_capacity(self.0.len());
        let mut in_index = false;
        for c in self.0.chars() {
            match c {
                '[' => {
                    in_index = true;
                    out.push('[');
                }
                ']' => {
                    in_index = false;
                    out.push(']');
                }
                c if in_index && c.is_ascii_digit() => {}
                c => out.push(c),
            }
        }
        JsonPath(out)
    }

    /// Borrow the locator string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JsonPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JsonPath {
    fn from(path: &str) -> Self {
        JsonPath(path.to_string())
    }
}

impl From<String> for JsonPath {
    fn from(path: String) -> Self {
        JsonPath(path)
    }
}

impl AsRef<str> for JsonPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_steps() {
        let path = JsonPath::root().key("owner").key("pets").items().key("name");
        assert_eq!(path.as_str(), "$.owner.pets[].name");
        assert_eq!(JsonPath::root().key("tags").index(3).as_str(), "$.tags[3]");
    }

    #[test]
    fn test_normalized_erases_indices() {
        let concrete = JsonPath::root().key("pets").index(12).key("tags").index(0);
        let schema_level = JsonPath::root().key("pets").items().key("tags").items();
        assert_eq!(concrete.normalized(), schema_level);
        assert_eq!(schema_level.normalized(), schema_level);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let path = JsonPath::root().key("id");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"$.id\"");
    }
}
