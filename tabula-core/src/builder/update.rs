//! UPDATE query builder module

use super::{QueryBuilder, Statement};
use crate::executor::{self, Executor};
use crate::fragment::Fragment;
use crate::table::TableInfo;
use crate::{Error, IntoArgs, Result, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// UPDATE query builder.
///
/// Without a `where_` predicate the statement updates every row of the
/// table. That is allowed; it is logged as a warning when run.
pub struct UpdateBuilder<E> {
    table: Arc<TableInfo>,
    set_clauses: Vec<(String, Value)>,
    predicate: Fragment,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for UpdateBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            set_clauses: self.set_clauses.clone(),
            predicate: self.predicate.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for UpdateBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateBuilder")
            .field("table", &self.table.name())
            .field("set_clauses", &self.set_clauses)
            .field("predicate", &self.predicate)
            .finish()
    }
}

impl<E> UpdateBuilder<E> {
    pub fn new(table: Arc<TableInfo>) -> Self {
        Self {
            table,
            set_clauses: Vec::new(),
            predicate: Fragment::new(),
            _entity: PhantomData,
        }
    }

    /// Assign `value` to `column`
    ///
    /// Setting the same column again replaces the earlier value but keeps
    /// its position in the SET list.
    ///
    /// # Examples
    /// ```
    /// use tabula_core::{QueryBuilder, Table};
    ///
    /// struct Todo;
    /// let todos: Table<Todo> = Table::new("todos", ("id", "title", "done")).unwrap();
    ///
    /// let query = todos
    ///     .update()
    ///     .set("title", "draft")
    ///     .set("done", true)
    ///     .set("title", "final")
    ///     .where_("id = ?", 1);
    ///
    /// assert_eq!(query.to_sql().unwrap(), "UPDATE todos SET title = ?, done = ? WHERE id = ?");
    /// assert_eq!(query.parameters().unwrap()[0], "final".into());
    /// ```
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        // undeclared names are kept as given and rejected by build()
        let column = self
            .table
            .columns()
            .resolve(column)
            .unwrap_or(column)
            .to_string();
        match self.set_clauses.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.set_clauses.push((column, value)),
        }
        self
    }

    /// Assign several columns at once, in iteration order
    pub fn set_values<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        pairs
            .into_iter()
            .fold(self, |builder, (column, value)| builder.set(column.as_ref(), value))
    }

    /// AND a raw predicate onto the WHERE clause
    pub fn where_<A>(mut self, template: impl Into<String>, args: A) -> Self
    where
        A: IntoArgs,
    {
        self.predicate = self.predicate.where_(template, args);
        self
    }

    pub fn where_fragment(mut self, fragment: Fragment) -> Self {
        self.predicate = self.predicate.merge(fragment);
        self
    }

    /// Whether the statement would touch every row
    pub fn is_unconditional(&self) -> bool {
        self.predicate.is_empty()
    }

    /// Run the update and return the number of affected rows
    pub async fn run<X>(self, executor: &X) -> Result<u64>
    where
        X: Executor,
    {
        let statement = self.build()?;
        if self.is_unconditional() {
            tracing::warn!(table = self.table.name(), "UPDATE without WHERE affects every row");
        }
        let result =
            executor::execute_statement(executor, "UPDATE", self.table.name(), &statement).await?;
        Ok(result.rows_affected)
    }
}

impl<E> QueryBuilder for UpdateBuilder<E> {
    fn build(&self) -> Result<Statement> {
        if self.set_clauses.is_empty() {
            return Err(Error::invalid_query("UPDATE requires SET clauses"));
        }
        self.table
            .columns()
            .validate(self.set_clauses.iter().map(|(c, _)| c.as_str()))?;

        // SET clause
        let set_parts: Vec<String> = self
            .set_clauses
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", self.table.name(), set_parts.join(", "));
        let mut args: Vec<Value> = self.set_clauses.iter().map(|(_, v)| v.clone()).collect();

        // WHERE clause
        self.predicate.render_where(&mut sql, &mut args)?;

        Ok(Statement { sql, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::RecordingExecutor;
    use crate::executor::ExecResult;
    use crate::Table;

    struct Todo;

    fn todos() -> Table<Todo> {
        Table::new("todos", ("id", "title", "done")).unwrap()
    }

    #[test]
    fn test_basic_update() {
        let statement = todos()
            .update()
            .set("title", "milk")
            .where_("id = ?", 1)
            .build()
            .unwrap();
        assert_eq!(statement.sql, "UPDATE todos SET title = ? WHERE id = ?");
        assert_eq!(statement.args, vec![Value::from("milk"), Value::I32(1)]);
    }

    #[test]
    fn test_last_write_wins() {
        let statement = todos()
            .update()
            .set("title", "a")
            .set("done", false)
            .set("title", "b")
            .build()
            .unwrap();
        assert_eq!(statement.sql, "UPDATE todos SET title = ?, done = ?");
        assert_eq!(statement.args, vec![Value::from("b"), Value::Bool(false)]);
    }

    #[test]
    fn test_qualified_and_bare_name_share_assignment() {
        let statement = todos()
            .update()
            .set("title", "a")
            .set("todos.title", "b")
            .where_("id = ?", 1)
            .build()
            .unwrap();
        assert_eq!(statement.sql, "UPDATE todos SET title = ? WHERE id = ?");
        assert_eq!(statement.args, vec![Value::from("b"), Value::I32(1)]);
    }

    #[test]
    fn test_set_values() {
        let query = todos()
            .update()
            .set_values([("title", Value::from("x")), ("done", Value::Bool(true))]);
        assert_eq!(query.to_sql().unwrap(), "UPDATE todos SET title = ?, done = ?");
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = todos().update().where_("id = ?", 1).build().unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let err = todos().update().set("priority", 3).build().unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "priority"));
    }

    #[test]
    fn test_update_without_predicate_is_unconditional() {
        let query = todos().update().set("done", true);
        assert!(query.is_unconditional());
        assert_eq!(query.to_sql().unwrap(), "UPDATE todos SET done = ?");
    }

    #[tokio::test]
    async fn test_run_returns_rows_affected() {
        let executor = RecordingExecutor::with_result(ExecResult {
            last_insert_id: 0,
            rows_affected: 4,
        });
        let affected = todos().update().set("done", true).run(&executor).await.unwrap();
        assert_eq!(affected, 4);
        assert_eq!(executor.statements()[0].sql, "UPDATE todos SET done = ?");
    }
}
