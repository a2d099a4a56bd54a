//! Error types for Tabula

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for Tabula operations
#[derive(Error, Debug)]
pub enum Error {
    /// INSERT values do not line up with the declared insert columns
    #[error("INSERT into '{table}' has {columns} columns but {values} values")]
    ColumnCountMismatch {
        table: String,
        columns: usize,
        values: usize,
    },

    /// A clause references a column the table does not declare
    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },

    /// Placeholder count and argument count of a fragment disagree
    #[error("Predicate '{predicate}' has {placeholders} placeholders but {arguments} arguments")]
    MalformedPredicate {
        predicate: String,
        placeholders: usize,
        arguments: usize,
    },

    /// A lookup that needs a row found none
    #[error("No matching row in '{table}'")]
    NotFound { table: String },

    /// A lookup that needs exactly one row found several
    #[error("Expected one row from '{table}', got {count}")]
    MultipleRows { table: String, count: usize },

    /// The executor failed to run a statement
    #[error("Failed to execute {operation} on '{table}': {source}")]
    Execution {
        operation: &'static str,
        table: String,
        #[source]
        source: BoxError,
    },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Invalid table or view declaration
    #[error("Invalid table: {message}")]
    InvalidTable { message: String },

    /// Row value could not be converted into an entity field
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Table not found in the registry
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Table registered twice
    #[error("Table '{table}' is already registered")]
    DuplicateTable { table: String },

    /// Database connection or transaction error outside a statement
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for Tabula operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new column count mismatch error
    pub fn column_count_mismatch(table: impl Into<String>, columns: usize, values: usize) -> Self {
        Self::ColumnCountMismatch {
            table: table.into(),
            columns,
            values,
        }
    }

    /// Create a new missing column error
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a new malformed predicate error
    pub fn malformed_predicate(
        predicate: impl Into<String>,
        placeholders: usize,
        arguments: usize,
    ) -> Self {
        Self::MalformedPredicate {
            predicate: predicate.into(),
            placeholders,
            arguments,
        }
    }

    /// Create a new not found error
    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
        }
    }

    /// Create a new multiple rows error
    pub fn multiple_rows(table: impl Into<String>, count: usize) -> Self {
        Self::MultipleRows {
            table: table.into(),
            count,
        }
    }

    /// Wrap an executor failure with the shape of the attempted statement
    pub fn execution<E>(operation: &'static str, table: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Execution {
            operation,
            table: table.into(),
            source: Box::new(source),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new invalid table error
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable {
            message: message.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a new table not found error
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Create a new duplicate table error
    pub fn duplicate_table(table: impl Into<String>) -> Self {
        Self::DuplicateTable {
            table: table.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the executor
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }
}
