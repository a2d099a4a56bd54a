//! Typed tables: an entity type bound to a table name and its columns

use crate::builder::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::columns::{is_identifier, ColumnSet, IntoColumns};
use crate::executor::{self, Executor};
use crate::{Entity, Error, Result, Statement, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Untyped description of a declared table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    name: String,
    columns: ColumnSet,
    primary_key: String,
    schema: Option<String>,
}

impl TableInfo {
    /// Declare a table. The primary key defaults to `id` when declared,
    /// otherwise to the first column.
    pub fn new<C>(name: &str, columns: C) -> Result<Self>
    where
        C: IntoColumns,
    {
        if !is_identifier(name) {
            return Err(Error::invalid_table(format!(
                "'{name}' is not a valid table name"
            )));
        }
        let columns = ColumnSet::new(name, columns)?;
        let primary_key = if columns.contains("id") {
            "id".to_string()
        } else {
            columns.all()[0].clone()
        };

        Ok(Self {
            name: name.to_string(),
            columns,
            primary_key,
            schema: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Raw DDL body used by `CREATE TABLE IF NOT EXISTS`
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// `CREATE TABLE IF NOT EXISTS <name> (<schema>)`, with the schema
    /// fragment inserted verbatim
    pub fn create_statement(&self) -> Result<Statement> {
        let schema = self.schema.as_deref().ok_or_else(|| {
            Error::invalid_query(format!("table '{}' has no schema to create", self.name))
        })?;
        Ok(Statement {
            sql: format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, schema.trim()),
            args: Vec::new(),
        })
    }

    pub(crate) async fn create_if_not_exists<X>(&self, executor: &X) -> Result<()>
    where
        X: Executor,
    {
        let statement = self.create_statement()?;
        executor::execute_statement(executor, "CREATE TABLE", &self.name, &statement).await?;
        Ok(())
    }
}

/// A table bound to the entity type its rows decode into.
///
/// Declared once at startup; clones are cheap handles to the same
/// declaration.
///
/// # Examples
/// ```
/// use tabula_core::{QueryBuilder, Table};
///
/// struct Todo;
///
/// let todos: Table<Todo> = Table::new("todos", ("id", "title"))
///     .unwrap()
///     .with_schema("id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL");
///
/// let query = todos.select().where_("id = ?", 1);
/// assert_eq!(query.to_sql().unwrap(), "SELECT id, title FROM todos WHERE id = ?");
/// ```
pub struct Table<E> {
    info: Arc<TableInfo>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self::from_info(self.info.clone())
    }
}

impl<E> fmt::Debug for Table<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("info", &self.info).finish()
    }
}

impl<E> Table<E> {
    /// Declare a table with its ordered column list
    pub fn new<C>(name: &str, columns: C) -> Result<Self>
    where
        C: IntoColumns,
    {
        Ok(Self::from_info(Arc::new(TableInfo::new(name, columns)?)))
    }

    /// Typed handle over an existing declaration
    pub fn from_info(info: Arc<TableInfo>) -> Self {
        Self {
            info,
            _entity: PhantomData,
        }
    }

    /// Attach the DDL body used by [`Table::create_if_not_exists`]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.info).schema = Some(schema.into());
        self
    }

    /// Use `column` as the key for [`Table::get_by_id`]
    pub fn with_primary_key(mut self, column: &str) -> Result<Self> {
        let column = self
            .info
            .columns
            .resolve(column)
            .ok_or_else(|| Error::missing_column(self.info.name(), column))?
            .to_string();
        Arc::make_mut(&mut self.info).primary_key = column;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn columns(&self) -> &ColumnSet {
        self.info.columns()
    }

    pub fn primary_key(&self) -> &str {
        self.info.primary_key()
    }

    pub fn schema(&self) -> Option<&str> {
        self.info.schema()
    }

    pub fn info(&self) -> &Arc<TableInfo> {
        &self.info
    }

    pub fn insert(&self) -> InsertBuilder<E> {
        InsertBuilder::new(self.info.clone())
    }

    pub fn select(&self) -> SelectBuilder<E> {
        SelectBuilder::new(self.info.clone())
    }

    pub fn update(&self) -> UpdateBuilder<E> {
        UpdateBuilder::new(self.info.clone())
    }

    pub fn delete(&self) -> DeleteBuilder<E> {
        DeleteBuilder::new(self.info.clone())
    }

    /// Create the table from its schema fragment unless it already exists.
    /// Running it again leaves the existing table and its rows untouched.
    pub async fn create_if_not_exists<X>(&self, executor: &X) -> Result<()>
    where
        X: Executor,
    {
        self.info.create_if_not_exists(executor).await
    }
}

impl<E> Table<E>
where
    E: Entity,
{
    /// Every row, with all declared columns
    pub async fn get_all<X>(&self, executor: &X) -> Result<Vec<E>>
    where
        X: Executor,
    {
        self.select().run(executor).await
    }

    /// The row whose primary key equals `id`.
    ///
    /// Fails with [`Error::NotFound`] when no row matches. Uniqueness is
    /// left to the key's own constraint; extra rows are ignored.
    pub async fn get_by_id<X, I>(&self, executor: &X, id: I) -> Result<E>
    where
        X: Executor,
        I: Into<Value>,
    {
        let predicate = format!("{} = ?", self.primary_key());
        let id: Value = id.into();
        self.select()
            .where_(predicate, id)
            .run(executor)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(self.name()))
    }
}
