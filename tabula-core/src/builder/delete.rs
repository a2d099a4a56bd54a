//! DELETE query builder module

use super::{QueryBuilder, Statement};
use crate::executor::{self, Executor};
use crate::fragment::Fragment;
use crate::table::TableInfo;
use crate::{IntoArgs, Result};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// DELETE query builder.
///
/// Like [`UpdateBuilder`](super::UpdateBuilder), a delete without a
/// predicate removes every row of the table.
pub struct DeleteBuilder<E> {
    table: Arc<TableInfo>,
    predicate: Fragment,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for DeleteBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            predicate: self.predicate.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for DeleteBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteBuilder")
            .field("table", &self.table.name())
            .field("predicate", &self.predicate)
            .finish()
    }
}

impl<E> DeleteBuilder<E> {
    pub fn new(table: Arc<TableInfo>) -> Self {
        Self {
            table,
            predicate: Fragment::new(),
            _entity: PhantomData,
        }
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

    pub fn is_unconditional(&self) -> bool {
        self.predicate.is_empty()
    }

    /// Run the delete and return the number of removed rows
    pub async fn run<X>(self, executor: &X) -> Result<u64>
    where
        X: Executor,
    {
        let statement = self.build()?;
        if self.is_unconditional() {
            tracing::warn!(table = self.table.name(), "DELETE without WHERE removes every row");
        }
        let result =
            executor::execute_statement(executor, "DELETE", self.table.name(), &statement).await?;
        Ok(result.rows_affected)
    }
}

impl<E> QueryBuilder for DeleteBuilder<E> {
    fn build(&self) -> Result<Statement> {
        let mut sql = format!("DELETE FROM {}", self.table.name());
        let mut args = Vec::new();
        self.predicate.render_where(&mut sql, &mut args)?;
        Ok(Statement { sql, args })
    }
}
