//! Storage collaborator used by generated data-access objects.
//!
//! Generated models never talk to a database directly. They build a
//! [`Query`], hand it to an `Arc<dyn Store>`, and convert the returned
//! [`Row`]s back into typed values with [`from_row`].
//!
//! ## Query shapes
//!
//! - [`Lookup::Key`] - single-column primary key lookups
//! - [`Lookup::Where`] - composite keys, as `"a = ? AND b = ?"` with
//!   positional arguments
//! - [`Query::filter`] - extra conditions added by relationship scopes
//!
//! ## Examples
//!
//! ```
//! use modelsmith::store::{Lookup, Query};
//! use serde_json::json;
//!
//! let query = Query::table("comments")
//!     .by_key("id", json!(7))
//!     .filter("post_id = ?", vec![json!(3)]);
//!
//! assert_eq!(query.table, "comments");
//! assert!(matches!(query.lookup, Lookup::Key { .. }));
//! assert_eq!(query.conditions.len(), 1);
//! ```

mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use memory::{MemoryStore, Operation, OperationKind};

/// A stored row: column name to value.
pub type Row = Map<String, Value>;

/// A query transformer, used for relationship scopes.
pub type ScopeFn = Box<dyn Fn(Query) -> Query + Send + Sync>;

/// How a query selects rows before extra conditions apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    All,
    Key { column: String, value: Value },
    Where { clause: String, args: Vec<Value> },
}

/// An extra `"column = ?"` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub clause: String,
    pub args: Vec<Value>,
}

/// A table plus row selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub lookup: Lookup,
    pub conditions: Vec<Condition>,
}

impl Query {
    /// Selects every row of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            lookup: Lookup::All,
            conditions: Vec::new(),
        }
    }

    pub fn by_key(mut self, column: impl Into<String>, value: Value) -> Self {
        self.lookup = Lookup::Key {
            column: column.into(),
            value,
        };
        self
    }

    pub fn by_where(mut self, clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.lookup = Lookup::Where {
            clause: clause.into(),
            args,
        };
        self
    }

    pub fn filter(mut self, clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.conditions.push(Condition {
            clause: clause.into(),
            args,
        });
        self
    }

    /// Applies a scope function.
    pub fn scoped(self, scope: &ScopeFn) -> Self {
        scope(self)
    }
}

/// Builds a composite-key clause from ordered column names.
///
/// ## Examples
///
/// ```
/// use modelsmith::store::where_clause;
///
/// assert_eq!(where_clause(&["account_id", "id"]), "account_id = ? AND id = ?");
/// ```
pub fn where_clause(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// The identity scope.
pub fn unscoped() -> ScopeFn {
    Box::new(|query| query)
}

/// Describes the join table behind a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub join_table: String,
    /// Table holding the owner rows; links are kept per owner table.
    pub owner_table: String,
    /// Join-table column holding the owner's key.
    pub owner_column: String,
    pub related_table: String,
    /// Join-table column holding the related row's key.
    pub related_column: String,
    /// Key column on the related table.
    pub related_key: String,
}

/// Backend that generated data-access objects read from and write to.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the first row matching `query`.
    async fn find(&self, query: &Query) -> Result<Option<Row>, StoreError>;

    async fn list(&self, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Inserts `row` and returns it with any assigned key columns filled in.
    async fn insert(&self, table: &str, keys: &[&str], row: Row) -> Result<Row, StoreError>;

    /// Applies `changes` to every matching row; returns the match count.
    async fn update(&self, query: &Query, changes: Row) -> Result<u64, StoreError>;

    async fn delete(&self, query: &Query) -> Result<u64, StoreError>;

    async fn associate(
        &self,
        association: &Association,
        owner: &Value,
        related: &Value,
    ) -> Result<(), StoreError>;

    async fn dissociate(
        &self,
        association: &Association,
        owner: &Value,
        related: &Value,
    ) -> Result<(), StoreError>;

    /// Lists related rows joined to `owner`.
    async fn associated(
        &self,
        association: &Association,
        owner: &Value,
    ) -> Result<Vec<Row>, StoreError>;
}

/// Converts a model into a row.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(
            format!("expected an object, got {other}"),
        ))),
    }
}

/// Converts a row into a model.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Drops `null` columns, leaving the fields a partial update should write.
pub fn without_nulls(row: Row) -> Row {
    row.into_iter().filter(|(_, v)| !v.is_null()).collect()
}
