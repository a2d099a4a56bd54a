//! Query builder module

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use crate::fragment::Predicate;
use crate::table::{Table, TableInfo};
use crate::{Error, Result, Value};
use std::sync::Arc;

// Re-export types from submodules
pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

/// Core trait for all query builders
pub trait QueryBuilder {
    /// Compile the accumulated clauses into SQL plus positional arguments.
    /// Fails before anything reaches an executor if the clauses are
    /// inconsistent.
    fn build(&self) -> Result<Statement>;

    /// Generate the SQL query string
    fn to_sql(&self) -> Result<String> {
        Ok(self.build()?.sql)
    }

    /// Get the parameters for the query
    fn parameters(&self) -> Result<Vec<Value>> {
        Ok(self.build()?.args)
    }
}

/// A compiled statement: SQL text with `?` placeholders and the values
/// bound to them, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
            JoinType::Full => write!(f, "FULL OUTER"),
        }
    }
}

/// A join between two declared tables on one column pair.
///
/// Both columns are checked against their table's column set when the
/// statement is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    kind: JoinType,
    left: Arc<TableInfo>,
    left_column: String,
    right: Arc<TableInfo>,
    right_column: String,
}

impl Join {
    /// `<kind> JOIN right ON left.left_column = right.right_column`
    pub fn new<L, R>(
        kind: JoinType,
        left: &Table<L>,
        left_column: &str,
        right: &Table<R>,
        right_column: &str,
    ) -> Self {
        Self {
            kind,
            left: left.info().clone(),
            left_column: left_column.to_string(),
            right: right.info().clone(),
            right_column: right_column.to_string(),
        }
    }

    pub fn inner<L, R>(left: &Table<L>, left_column: &str, right: &Table<R>, right_column: &str) -> Self {
        Self::new(JoinType::Inner, left, left_column, right, right_column)
    }

    pub fn left<L, R>(left: &Table<L>, left_column: &str, right: &Table<R>, right_column: &str) -> Self {
        Self::new(JoinType::Left, left, left_column, right, right_column)
    }

    /// Name of the table being joined in
    pub fn joined_table(&self) -> &str {
        self.right.name()
    }

    pub(crate) fn to_sql(&self) -> Result<String> {
        self.left.columns().validate([self.left_column.as_str()])?;
        self.right.columns().validate([self.right_column.as_str()])?;
        Ok(format!(
            "{} JOIN {} ON {}.{} = {}.{}",
            self.kind,
            self.right.name(),
            self.left.name(),
            self.left_column,
            self.right.name(),
            self.right_column
        ))
    }
}

/// A JOIN clause attached to a select
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JoinClause {
    /// Caller-written join text, optionally with `?` arguments
    Raw(Predicate),
    On(Join),
}

const JOIN_PREFIXES: &[&str] = &[
    "JOIN ",
    "INNER JOIN ",
    "CROSS JOIN ",
    "NATURAL JOIN ",
    "LEFT JOIN ",
    "LEFT OUTER JOIN ",
    "RIGHT JOIN ",
    "RIGHT OUTER JOIN ",
    "FULL JOIN ",
    "FULL OUTER JOIN ",
];

impl JoinClause {
    pub(crate) fn render(&self, sql: &mut String, args: &mut Vec<Value>) -> Result<()> {
        match self {
            JoinClause::Raw(predicate) => {
                let text = predicate.template.trim();
                let upper = text.to_ascii_uppercase();
                if text.contains(';') || !JOIN_PREFIXES.iter().any(|p| upper.starts_with(p)) {
                    return Err(Error::invalid_query(format!(
                        "'{text}' is not a JOIN clause"
                    )));
                }
                predicate.check()?;
                sql.push_str(text);
                args.extend(predicate.args.iter().cloned());
            }
            JoinClause::On(join) => sql.push_str(&join.to_sql()?),
        }
        Ok(())
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderByClause {
    pub column: String,
    pub direction: SortDirection,
}
