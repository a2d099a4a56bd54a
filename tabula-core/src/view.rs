//! Read-only views composed from a table's select

use crate::builder::{QueryBuilder, SelectBuilder};
use crate::table::{Table, TableInfo};
use crate::{Entity, Error, Executor, Result, Value};
use std::fmt;
use std::sync::Arc;

type Factory<E> = Arc<dyn Fn(SelectBuilder<E>) -> SelectBuilder<E> + Send + Sync>;

/// A projection built on top of an owning table, typically joining in
/// columns from other tables.
///
/// Fetch-by-id filters on the owner's primary key. A view has no insert,
/// update or delete; writes go through the owning [`Table`].
///
/// # Examples
/// ```
/// use tabula_core::{QueryBuilder, Table, View};
///
/// struct Todo;
/// struct TodoWithAuthor;
///
/// let todos: Table<Todo> = Table::new("todos", ("id", "title", "author_id")).unwrap();
/// let view: View<TodoWithAuthor> = View::new(&todos, |select| {
///     select
///         .join("INNER JOIN users ON users.id = todos.author_id")
///         .extra_columns("users.name AS author")
/// })
/// .unwrap();
///
/// assert_eq!(
///     view.select().to_sql().unwrap(),
///     "SELECT todos.id, todos.title, todos.author_id, users.name AS author \
///      FROM todos INNER JOIN users ON users.id = todos.author_id"
/// );
/// ```
pub struct View<E> {
    owner: Arc<TableInfo>,
    factory: Factory<E>,
}

impl<E> Clone for View<E> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<E> fmt::Debug for View<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("owner", &self.owner.name())
            .finish_non_exhaustive()
    }
}

impl<E> View<E> {
    /// Declare a view over `owner`.
    ///
    /// The factory receives a fresh select on the owner and returns the
    /// base query of the view. It is compiled once here so that a broken
    /// factory, or one whose projection drops the owner's primary key,
    /// fails at declaration time.
    pub fn new<O, F>(owner: &Table<O>, factory: F) -> Result<Self>
    where
        F: Fn(SelectBuilder<E>) -> SelectBuilder<E> + Send + Sync + 'static,
    {
        let view = Self {
            owner: owner.info().clone(),
            factory: Arc::new(factory),
        };

        let base = view.select();
        base.build()?;
        if !base.projects(view.owner.primary_key()) {
            return Err(Error::invalid_table(format!(
                "view over '{}' must select primary key '{}'",
                view.owner.name(),
                view.owner.primary_key()
            )));
        }

        Ok(view)
    }

    /// Name of the owning table
    pub fn name(&self) -> &str {
        self.owner.name()
    }

    pub fn primary_key(&self) -> &str {
        self.owner.primary_key()
    }

    /// The view's base query, ready for more clauses
    pub fn select(&self) -> SelectBuilder<E> {
        (self.factory)(SelectBuilder::new(self.owner.clone()))
    }
}

impl<E> View<E>
where
    E: Entity,
{
    pub async fn get_all<X>(&self, executor: &X) -> Result<Vec<E>>
    where
        X: Executor,
    {
        self.select().run(executor).await
    }

    /// The row whose owner primary key equals `id`. The predicate is
    /// qualified with the owner's name, so joined tables may reuse the
    /// key's column name.
    pub async fn get_by_id<X, I>(&self, executor: &X, id: I) -> Result<E>
    where
        X: Executor,
        I: Into<Value>,
    {
        let predicate = format!("{}.{} = ?", self.owner.name(), self.owner.primary_key());
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
