//! Declared column lists and identifier checks

use crate::{Error, Result};
use std::sync::Arc;

/// Immutable, ordered list of the columns a table declares.
///
/// Cloning is cheap: every builder derived from a table shares the same
/// storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    table: Arc<str>,
    names: Arc<[String]>,
}

impl ColumnSet {
    /// Build a column set for `table`, rejecting empty lists, duplicates and
    /// names that are not plain identifiers.
    pub fn new<C>(table: &str, columns: C) -> Result<Self>
    where
        C: IntoColumns,
    {
        let names = columns.into_columns();
        if names.is_empty() {
            return Err(Error::invalid_table(format!(
                "table '{table}' must declare at least one column"
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if !is_identifier(name) {
                return Err(Error::invalid_table(format!(
                    "'{name}' is not a valid column name for table '{table}'"
                )));
            }
            if names[..i].contains(name) {
                return Err(Error::invalid_table(format!(
                    "column '{name}' is declared twice on table '{table}'"
                )));
            }
        }

        Ok(Self {
            table: Arc::from(table),
            names: names.into(),
        })
    }

    /// All declared columns in declaration order
    pub fn all(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The declared column `name` refers to. A qualifier naming this table
    /// is stripped; any other qualifier never resolves.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let bare = match name.split_once('.') {
            Some((table, column)) if table == &*self.table => column,
            Some(_) => return None,
            None => name,
        };
        self.names.iter().map(String::as_str).find(|c| *c == bare)
    }

    /// Whether `name` (bare, or qualified with this table) is declared
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Check that every referenced name is declared
    pub fn validate<'a, I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match names.into_iter().find(|name| !self.contains(name)) {
            Some(missing) => Err(Error::missing_column(&*self.table, missing)),
            None => Ok(()),
        }
    }

    /// Columns rendered as `table.column`, for statements that join
    pub fn qualified(&self) -> Vec<String> {
        self.names
            .iter()
            .map(|c| format!("{}.{}", self.table, c))
            .collect()
    }
}

/// Whether `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Trait to convert various types into columns
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for &[&str] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

// For tuples
impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![
            self.0.to_string(),
            self.1.to_string(),
            self.2.to_string(),
            self.3.to_string(),
        ]
    }
}

impl IntoColumns for (&str, &str, &str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![
            self.0.to_string(),
            self.1.to_string(),
            self.2.to_string(),
            self.3.to_string(),
            self.4.to_string(),
        ]
    }
}
