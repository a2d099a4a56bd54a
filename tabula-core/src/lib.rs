//! Tabula Core - typed tables and views over `?`-parameterized SQL
//!
//! Declare an entity type and its table once, then build INSERT, SELECT,
//! UPDATE and DELETE statements against it. Builders compile to SQL text
//! plus positional arguments, run through any [`Executor`], and decode
//! result rows back into the entity type.

pub mod builder;
pub mod columns;
mod de;
pub mod error;
pub mod executor;
pub mod fragment;
pub mod registry;
pub mod row;
pub mod table;
pub mod value;
pub mod view;


// Re-export main types
pub use builder::{
    DeleteBuilder, InsertBuilder, Join, JoinType, QueryBuilder, SelectBuilder, SortDirection,
    Statement, UpdateBuilder,
};
pub use columns::{ColumnSet, IntoColumns};
pub use error::{Error, Result};
pub use executor::{ExecResult, Executor};
pub use fragment::{Fragment, Predicate};
pub use registry::Registry;
pub use row::{Entity, Mapping, Row};
pub use table::{Table, TableInfo};
pub use value::{FromValue, IntoArgs, Value};
pub use view::View;

#[cfg(feature = "sqlite")]
pub use executor::sqlite::{SqliteConfig, SqlitePool, SqliteTransaction};
