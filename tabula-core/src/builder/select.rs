//! SELECT query builder implementation

use super::{Join, JoinClause, OrderByClause, QueryBuilder, SortDirection, Statement};
use crate::columns::{is_identifier, IntoColumns};
use crate::executor::{self, Executor};
use crate::fragment::{Fragment, Predicate};
use crate::table::TableInfo;
use crate::{Entity, Error, IntoArgs, Result, Row};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// SELECT builder bound to a table and the entity its rows decode into.
///
/// The projection defaults to every declared column. Clause methods
/// consume the builder and return the updated one; clone first to branch.
///
/// # Examples
/// ```
/// use tabula_core::{QueryBuilder, Table};
///
/// struct Todo;
///
/// let todos: Table<Todo> = Table::new("todos", ("id", "title", "user_id")).unwrap();
///
/// let query = todos
///     .select()
///     .join("INNER JOIN users ON users.id = todos.user_id")
///     .extra_columns("users.name")
///     .where_("todos.title LIKE ?", "%milk%")
///     .order_by_desc("todos.id")
///     .limit(10);
///
/// assert_eq!(
///     query.to_sql().unwrap(),
///     "SELECT todos.id, todos.title, todos.user_id, users.name FROM todos \
///      INNER JOIN users ON users.id = todos.user_id \
///      WHERE todos.title LIKE ? ORDER BY todos.id DESC LIMIT 10"
/// );
/// ```
pub struct SelectBuilder<E> {
    table: Arc<TableInfo>,
    columns: Option<Vec<String>>,
    extra_columns: Vec<String>,
    joins: Vec<JoinClause>,
    predicate: Fragment,
    order_by: Vec<OrderByClause>,
    limit: Option<u64>,
    offset: Option<u64>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SelectBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: self.columns.clone(),
            extra_columns: self.extra_columns.clone(),
            joins: self.joins.clone(),
            predicate: self.predicate.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for SelectBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectBuilder")
            .field("table", &self.table.name())
            .field("columns", &self.columns)
            .field("extra_columns", &self.extra_columns)
            .field("joins", &self.joins)
            .field("predicate", &self.predicate)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<E> SelectBuilder<E> {
    pub fn new(table: Arc<TableInfo>) -> Self {
        Self {
            table,
            columns: None,
            extra_columns: Vec::new(),
            joins: Vec::new(),
            predicate: Fragment::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            _entity: PhantomData,
        }
    }

    /// Name of the table rows are selected from
    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    /// Replace the default projection. Every name must be declared on the
    /// table, bare or qualified with the table name.
    pub fn columns<C>(mut self, columns: C) -> Self
    where
        C: IntoColumns,
    {
        self.columns = Some(columns.into_columns());
        self
    }

    /// Append expressions after the projection, typically columns of a
    /// joined table. Not checked against any column set.
    pub fn extra_columns<C>(mut self, columns: C) -> Self
    where
        C: IntoColumns,
    {
        self.extra_columns.extend(columns.into_columns());
        self
    }

    /// Append a raw JOIN clause
    pub fn join(self, clause: impl Into<String>) -> Self {
        self.join_with(clause, ())
    }

    /// Append a raw JOIN clause whose text carries `?` placeholders
    pub fn join_with<A>(mut self, clause: impl Into<String>, args: A) -> Self
    where
        A: IntoArgs,
    {
        self.joins.push(JoinClause::Raw(Predicate::new(clause, args)));
        self
    }

    /// Append a join between two declared tables
    pub fn join_on(mut self, join: Join) -> Self {
        self.joins.push(JoinClause::On(join));
        self
    }

    /// AND a raw predicate onto the WHERE clause
    pub fn where_<A>(mut self, template: impl Into<String>, args: A) -> Self
    where
        A: IntoArgs,
    {
        self.predicate = self.predicate.where_(template, args);
        self
    }

    /// AND every predicate of an existing fragment onto the WHERE clause
    pub fn where_fragment(mut self, fragment: Fragment) -> Self {
        self.predicate = self.predicate.merge(fragment);
        self
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order_by.push(OrderByClause {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether the projection includes `column` of this table
    pub fn projects(&self, column: &str) -> bool {
        let qualified = format!("{}.{}", self.table.name(), column);
        let overridden = match &self.columns {
            None => self.table.columns().contains(column),
            Some(columns) => columns.iter().any(|c| c == column || *c == qualified),
        };
        overridden || self.extra_columns.iter().any(|c| *c == qualified)
    }

    /// Without joins an ORDER BY column must be declared on this table.
    /// With joins it may also name a joined table's column or an output
    /// alias, as long as it is `column` or `table.column`.
    fn check_order_column(&self, column: &str) -> Result<()> {
        let columns = self.table.columns();
        if self.joins.is_empty() {
            return columns.validate([column]);
        }
        match column.split_once('.') {
            Some((table, _)) if table == self.table.name() => columns.validate([column]),
            Some((table, name)) if is_identifier(table) && is_identifier(name) => Ok(()),
            None if is_identifier(column) => Ok(()),
            _ => Err(Error::invalid_query(format!(
                "'{column}' is not a valid ORDER BY column"
            ))),
        }
    }

    fn projection(&self) -> Result<Vec<String>> {
        let mut projection = match &self.columns {
            Some(columns) => {
                self.table.columns().validate(columns.iter().map(String::as_str))?;
                columns.clone()
            }
            None if self.joins.is_empty() => self.table.columns().all().to_vec(),
            // joined tables may share column names
            None => self.table.columns().qualified(),
        };
        projection.extend(self.extra_columns.iter().cloned());
        if projection.is_empty() {
            return Err(Error::invalid_query("SELECT requires at least one column"));
        }
        Ok(projection)
    }
}

impl<E> QueryBuilder for SelectBuilder<E> {
    fn build(&self) -> Result<Statement> {
        let mut args = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.projection()?.join(", "),
            self.table.name()
        );

        // JOIN clauses
        for join in &self.joins {
            sql.push(' ');
            join.render(&mut sql, &mut args)?;
        }

        // WHERE clause
        self.predicate.render_where(&mut sql, &mut args)?;

        // ORDER BY clause
        if !self.order_by.is_empty() {
            for order in &self.order_by {
                self.check_order_column(&order.column)?;
            }
            let parts: Vec<String> = self
                .order_by
                .iter()
                .map(|o| format!("{} {}", o.column, o.direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        Ok(Statement { sql, args })
    }
}

impl<E> SelectBuilder<E>
where
    E: Entity,
{
    /// Run the query and decode every returned row
    pub async fn run<X>(self, executor: &X) -> Result<Vec<E>>
    where
        X: Executor,
    {
        self.fetch(executor).await?.iter().map(E::from_row).collect()
    }

    /// Run the query expecting exactly one row.
    ///
    /// Zero rows fail with [`Error::NotFound`], more than one with
    /// [`Error::MultipleRows`].
    pub async fn only<X>(self, executor: &X) -> Result<E>
    where
        X: Executor,
    {
        let rows = self.fetch(executor).await?;
        match rows.as_slice() {
            [row] => E::from_row(row),
            [] => Err(Error::not_found(self.table.name())),
            _ => Err(Error::multiple_rows(self.table.name(), rows.len())),
        }
    }

    async fn fetch<X>(&self, executor: &X) -> Result<Vec<Row>>
    where
        X: Executor,
    {
        let statement = self.build()?;
        executor::fetch_rows(executor, "SELECT", self.table.name(), &statement).await
    }
}
