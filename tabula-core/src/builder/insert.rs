//! INSERT query builder module

use super::{QueryBuilder, Statement};
use crate::columns::IntoColumns;
use crate::executor::{self, ExecResult, Executor};
use crate::table::TableInfo;
use crate::{Error, IntoArgs, Result, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// INSERT query builder
///
/// # Examples
/// ```
/// use tabula_core::{QueryBuilder, Table};
///
/// struct Todo;
/// let todos: Table<Todo> = Table::new("todos", ("id", "title", "done")).unwrap();
///
/// let query = todos.insert().columns(("title", "done")).values(("milk", false));
/// assert_eq!(query.to_sql().unwrap(), "INSERT INTO todos (title, done) VALUES (?, ?)");
/// ```
pub struct InsertBuilder<E> {
    table: Arc<TableInfo>,
    columns: Vec<String>,
    values: Vec<Value>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for InsertBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: self.columns.clone(),
            values: self.values.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for InsertBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertBuilder")
            .field("table", &self.table.name())
            .field("columns", &self.columns)
            .field("values", &self.values)
            .finish()
    }
}

impl<E> InsertBuilder<E> {
    pub fn new(table: Arc<TableInfo>) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Set the columns to insert into, replacing any earlier list
    pub fn columns<C>(mut self, columns: C) -> Self
    where
        C: IntoColumns,
    {
        self.columns = columns.into_columns();
        self
    }

    /// Set the positional values, one per column
    pub fn values<A>(mut self, values: A) -> Self
    where
        A: IntoArgs,
    {
        self.values = values.into_args();
        self
    }

    /// Run the insert and return the generated row id
    pub async fn run<X>(self, executor: &X) -> Result<i64>
    where
        X: Executor,
    {
        Ok(self.execute(executor).await?.last_insert_id)
    }

    /// Run the insert and return the full executor result
    pub async fn execute<X>(self, executor: &X) -> Result<ExecResult>
    where
        X: Executor,
    {
        let statement = self.build()?;
        executor::execute_statement(executor, "INSERT", self.table.name(), &statement).await
    }
}

impl<E> QueryBuilder for InsertBuilder<E> {
    fn build(&self) -> Result<Statement> {
        if self.columns.is_empty() {
            return Err(Error::invalid_query("INSERT requires at least one column"));
        }
        let declared = self.table.columns();
        let mut columns: Vec<&str> = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let column = declared
                .resolve(name)
                .ok_or_else(|| Error::missing_column(self.table.name(), name.as_str()))?;
            if columns.contains(&column) {
                return Err(Error::invalid_query(format!(
                    "column '{column}' listed twice in INSERT"
                )));
            }
            columns.push(column);
        }
        if self.values.len() != columns.len() {
            return Err(Error::column_count_mismatch(
                self.table.name(),
                self.columns.len(),
                self.values.len(),
            ));
        }

        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table.name(),
            columns.join(", "),
            placeholders
        );

        Ok(Statement {
            sql,
            args: self.values.clone(),
        })
    }
}
