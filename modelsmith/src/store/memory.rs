//! In-memory [`Store`] with an operation log.
//!
//! `MemoryStore` evaluates the equality-only query language generated models
//! emit (`"column = ?"` fragments joined by `AND`) and records every call,
//! which lets tests assert exactly which lookups a data-access object issued.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use strum::Display;

use super::{Association, Lookup, Query, Row, Store};
use crate::error::StoreError;

/// The kind of a recorded [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Find,
    List,
    Insert,
    Update,
    Delete,
    Associate,
    Dissociate,
    Associated,
}

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Find(Query),
    List(Query),
    Insert { table: String, row: Row },
    Update { query: Query, changes: Row },
    Delete(Query),
    Associate { join_table: String, owner_table: String, owner: Value, related: Value },
    Dissociate { join_table: String, owner_table: String, owner: Value, related: Value },
    Associated { join_table: String, owner_table: String, owner: Value },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Find(_) => OperationKind::Find,
            Self::List(_) => OperationKind::List,
            Self::Insert { .. } => OperationKind::Insert,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete(_) => OperationKind::Delete,
            Self::Associate { .. } => OperationKind::Associate,
            Self::Dissociate { .. } => OperationKind::Dissociate,
            Self::Associated { .. } => OperationKind::Associated,
        }
    }

    /// The table (or join table) the operation touched.
    pub fn table(&self) -> &str {
        match self {
            Self::Find(q) | Self::List(q) | Self::Delete(q) => &q.table,
            Self::Update { query, .. } => &query.table,
            Self::Insert { table, .. } => table,
            Self::Associate { join_table, .. }
            | Self::Dissociate { join_table, .. }
            | Self::Associated { join_table, .. } => join_table,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    /// Join table to `(owner table, owner key, related key)` links.
    joins: HashMap<String, Vec<(String, Value, Value)>>,
    sequences: HashMap<String, i64>,
    operations: Vec<Operation>,
    failing: HashSet<OperationKind>,
}

/// An in-memory storage backend.
///
/// ## Examples
///
/// ```
/// use modelsmith::store::{MemoryStore, OperationKind, Query, Store};
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = MemoryStore::new();
/// let row = json!({"label": "gear"}).as_object().cloned().unwrap();
/// let inserted = store.insert("widgets", &["id"], row).await.unwrap();
/// assert_eq!(inserted["id"], json!(1));
///
/// let found = store.find(&Query::table("widgets").by_key("id", json!(1))).await.unwrap();
/// assert!(found.is_some());
/// assert_eq!(store.count(OperationKind::Find), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seeds a row without recording an operation.
    pub fn seed(&self, table: &str, row: Row) {
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Returns every recorded operation in call order.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    /// Counts recorded operations of one kind.
    pub fn count(&self, kind: OperationKind) -> usize {
        self.state()
            .operations
            .iter()
            .filter(|op| op.kind() == kind)
            .count()
    }

    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Makes every later operation of `kind` fail.
    pub fn fail_on(&self, kind: OperationKind) {
        self.state().failing.insert(kind);
    }

    /// Returns a snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }
}

fn record(state: &mut State, operation: Operation) -> Result<(), StoreError> {
    let kind = operation.kind();
    let table = operation.table().to_string();
    tracing::debug!(operation = %kind, table = %table, "memory store operation");
    state.operations.push(operation);
    if state.failing.contains(&kind) {
        return Err(StoreError::operation(kind.to_string(), table, "injected failure"));
    }
    Ok(())
}

fn fragment_pattern() -> Option<&'static Regex> {
    static FRAGMENT: OnceLock<Option<Regex>> = OnceLock::new();
    FRAGMENT
        .get_or_init(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*\?\s*$").ok())
        .as_ref()
}

/// Parses `"a = ? AND b = ?"` into column names.
fn clause_columns(clause: &str) -> Result<Vec<String>, StoreError> {
    let unsupported = || StoreError::UnsupportedClause(clause.to_string());
    let pattern = fragment_pattern().ok_or_else(unsupported)?;
    clause
        .split(" AND ")
        .map(|fragment| {
            pattern
                .captures(fragment)
                .map(|c| c[1].to_string())
                .ok_or_else(unsupported)
        })
        .collect()
}

fn equality_matches(row: &Row, clause: &str, args: &[Value]) -> Result<bool, StoreError> {
    let columns = clause_columns(clause)?;
    if columns.len() != args.len() {
        return Err(StoreError::UnsupportedClause(format!(
            "{clause} expects {} arguments, got {}",
            columns.len(),
            args.len()
        )));
    }
    Ok(columns
        .iter()
        .zip(args)
        .all(|(column, arg)| row.get(column).is_some_and(|v| v == arg)))
}

fn matches(row: &Row, query: &Query) -> Result<bool, StoreError> {
    let selected = match &query.lookup {
        Lookup::All => true,
        Lookup::Key { column, value } => row.get(column).is_some_and(|v| v == value),
        Lookup::Where { clause, args } => equality_matches(row, clause, args)?,
    };
    if !selected {
        return Ok(false);
    }
    for condition in &query.conditions {
        if !equality_matches(row, &condition.clause, &condition.args)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn select(state: &State, query: &Query) -> Result<Vec<Row>, StoreError> {
    let mut out = Vec::new();
    for row in state.tables.get(&query.table).into_iter().flatten() {
        if matches(row, query)? {
            out.push(row.clone());
        }
    }
    Ok(out)
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, query: &Query) -> Result<Option<Row>, StoreError> {
        let mut state = self.state();
        record(&mut state, Operation::Find(query.clone()))?;
        Ok(select(&state, query)?.into_iter().next())
    }

    async fn list(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let mut state = self.state();
        record(&mut state, Operation::List(query.clone()))?;
        select(&state, query)
    }

    async fn insert(&self, table: &str, keys: &[&str], mut row: Row) -> Result<Row, StoreError> {
        let mut state = self.state();
        record(
            &mut state,
            Operation::Insert {
                table: table.to_string(),
                row: row.clone(),
            },
        )?;

        // Single integer keys left unset are assigned from a per-table sequence.
        if let [key] = keys {
            let unset = match row.get(*key) {
                None | Some(Value::Null) => true,
                Some(v) => v.as_i64() == Some(0),
            };
            if unset {
                let next = state.sequences.entry(table.to_string()).or_insert(0);
                *next += 1;
                let assigned = *next;
                row.insert((*key).to_string(), Value::from(assigned));
            } else if let Some(explicit) = row.get(*key).and_then(Value::as_i64) {
                let next = state.sequences.entry(table.to_string()).or_insert(0);
                *next = (*next).max(explicit);
            }
        }

        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, query: &Query, changes: Row) -> Result<u64, StoreError> {
        let mut state = self.state();
        record(
            &mut state,
            Operation::Update {
                query: query.clone(),
                changes: changes.clone(),
            },
        )?;
        let mut updated = 0;
        if let Some(rows) = state.tables.get_mut(&query.table) {
            for row in rows.iter_mut() {
                if matches(row, query)? {
                    for (column, value) in &changes {
                        row.insert(column.clone(), value.clone());
                    }
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<u64, StoreError> {
        let mut state = self.state();
        record(&mut state, Operation::Delete(query.clone()))?;
        let Some(rows) = state.tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let mut kept = Vec::with_capacity(rows.len());
        let mut removed = 0;
        for row in rows.iter() {
            if matches(row, query)? {
                removed += 1;
            } else {
                kept.push(row.clone());
            }
        }
        *rows = kept;
        Ok(removed)
    }

    async fn associate(
        &self,
        association: &Association,
        owner: &Value,
        related: &Value,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        record(
            &mut state,
            Operation::Associate {
                join_table: association.join_table.clone(),
                owner_table: association.owner_table.clone(),
                owner: owner.clone(),
                related: related.clone(),
            },
        )?;
        let links = state
            .joins
            .entry(association.join_table.clone())
            .or_default();
        let link = (association.owner_table.clone(), owner.clone(), related.clone());
        if !links.contains(&link) {
            links.push(link);
        }
        Ok(())
    }

    async fn dissociate(
        &self,
        association: &Association,
        owner: &Value,
        related: &Value,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        record(
            &mut state,
            Operation::Dissociate {
                join_table: association.join_table.clone(),
                owner_table: association.owner_table.clone(),
                owner: owner.clone(),
                related: related.clone(),
            },
        )?;
        if let Some(links) = state.joins.get_mut(&association.join_table) {
            links.retain(|(t, o, r)| !(*t == association.owner_table && o == owner && r == related));
        }
        Ok(())
    }

    async fn associated(
        &self,
        association: &Association,
        owner: &Value,
    ) -> Result<Vec<Row>, StoreError> {
        let mut state = self.state();
        record(
            &mut state,
            Operation::Associated {
                join_table: association.join_table.clone(),
                owner_table: association.owner_table.clone(),
                owner: owner.clone(),
            },
        )?;
        let related: Vec<&Value> = state
            .joins
            .get(&association.join_table)
            .into_iter()
            .flatten()
            .filter(|(t, o, _)| *t == association.owner_table && o == owner)
            .map(|(_, _, r)| r)
            .collect();
        Ok(state
            .tables
            .get(&association.related_table)
            .into_iter()
            .flatten()
            .filter(|row| {
                row.get(&association.related_key)
                    .is_some_and(|key| related.contains(&key))
            })
            .cloned()
            .collect())
    }
}
