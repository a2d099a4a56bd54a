//! Startup-time registry of declared tables

use crate::table::{Table, TableInfo};
use crate::{Error, Executor, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Collection of table declarations, filled once during startup and then
/// shared read-only (typically behind an `Arc` or in application state).
///
/// # Examples
/// ```
/// use tabula_core::{Registry, Table};
///
/// struct Todo;
///
/// let todos: Table<Todo> = Table::new("todos", ("id", "title")).unwrap();
/// let mut registry = Registry::new();
/// registry.register(&todos).unwrap();
///
/// let handle = registry.table::<Todo>("todos").unwrap();
/// assert_eq!(handle.columns().all(), ["id", "title"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tables: Vec<Arc<TableInfo>>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. Names must be unique across the registry.
    pub fn register<E>(&mut self, table: &Table<E>) -> Result<()> {
        if self.by_name.contains_key(table.name()) {
            return Err(Error::duplicate_table(table.name()));
        }
        self.by_name.insert(table.name().to_string(), self.tables.len());
        self.tables.push(table.info().clone());
        Ok(())
    }

    /// Builder-style [`Registry::register`]
    pub fn with<E>(mut self, table: &Table<E>) -> Result<Self> {
        self.register(table)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TableInfo>> {
        self.by_name.get(name).map(|&i| &self.tables[i])
    }

    /// Typed handle to a registered table. The entity type is chosen by the
    /// caller and is not checked against the one used at registration.
    pub fn table<E>(&self, name: &str) -> Result<Table<E>> {
        self.get(name)
            .map(|info| Table::from_info(info.clone()))
            .ok_or_else(|| Error::table_not_found(name))
    }

    /// Registered table names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Run `CREATE TABLE IF NOT EXISTS` for every table that carries a
    /// schema, in registration order. Tables without one are skipped.
    pub async fn create_all<X>(&self, executor: &X) -> Result<()>
    where
        X: Executor,
    {
        for info in self.tables.iter().filter(|t| t.schema().is_some()) {
            info.create_if_not_exists(executor).await?;
        }
        tracing::debug!(tables = self.tables.len(), "registry tables created");
        Ok(())
    }
}
