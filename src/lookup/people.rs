//! Local flat-file people database.

use crate::identity::FullName;
use crate::types::Result;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub number: String,
}

impl Person {
    pub fn render(&self) -> String {
        format!(
            "First name: {}\nLast name: {}\nAddress: {}\nNumber: {}",
            self.first_name, self.last_name, self.address, self.number
        )
    }
}

/// JSON database of known persons: `{"users": [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonDatabase {
    #[serde(default)]
    users: Vec<Person>,
}

impl PersonDatabase {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// First person whose first and last name match exactly.
    pub fn find(&self, name: &FullName) -> Option<&Person> {
        self.users
            .iter()
            .find(|p| p.first_name == name.first && p.last_name == name.last)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
