//! Session of the persistence
//!
//! A session owns one connection and is used by one thread at a time. Every
//! write starts a transaction lazily, the transaction ends by `commit()` or
//! `rollback()`. A session dropped with an open transaction rolls it back.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use log::{debug, error, warn};
use rusqlite::{params_from_iter, Connection, Row};
use ujorm_core::{AnyKey, Criterion, Key, Ujo, Value};

use crate::decoder::CriterionDecoder;
use crate::error::{OrmError, Result};
use crate::foreign_key::ForeignKey;
use crate::handler::OrmHandler;
use crate::meta::{MetaColumn, MetaTable, OrmUjo};
use crate::query::Query;
use crate::sqlite::{params_of, value_from_ref};

/// Unit of work bound to one connection
pub struct Session {
    handler: OrmHandler,
    conn: Connection,
    in_transaction: bool,
    rollback_only: bool,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("in_transaction", &self.in_transaction)
            .field("rollback_only", &self.rollback_only)
            .finish()
    }
}

impl Session {
    pub(crate) fn new(handler: OrmHandler, conn: Connection) -> Self {
        Session {
            handler,
            conn,
            in_transaction: false,
            rollback_only: false,
        }
    }

    /// Handler of the session
    pub fn handler(&self) -> &OrmHandler {
        &self.handler
    }

    /// Underlying connection for native statements
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Is a transaction open
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Will the next commit roll back
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// Insert the object, a generated primary key is written back
    pub fn insert<U: OrmUjo>(&mut self, ujo: &mut U) -> Result<()> {
        let table = self.handler.table_of::<U>()?.clone();
        let mut names = Vec::new();
        let mut params = Vec::new();
        let mut generated = None;

        for column in &table.columns {
            let value = column.key.effective_value(ujo);
            if value.is_null() && table.is_generated(column) {
                generated = Some(column);
                continue;
            }
            names.extend(column.column_names().map(str::to_string));
            params.extend(flatten(column, value)?);
        }

        let table_name = self.handler.dialect().table_name(&table);
        let sql = if names.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table_name)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table_name,
                names.join(", "),
                vec!["?"; names.len()].join(", ")
            )
        };
        self.execute(&sql, &params)?;

        if let Some(column) = generated {
            let id = Value::BigInt(self.conn.last_insert_rowid()).coerce(column.key.value_type())?;
            ujo.write_value(&column.key, id)?;
        }
        Ok(())
    }

    /// Insert all objects
    pub fn insert_all<U: OrmUjo>(&mut self, items: &mut [U]) -> Result<()> {
        for ujo in items.iter_mut() {
            self.insert(ujo)?;
        }
        Ok(())
    }

    /// Update all columns of the row by the primary key, the count of changed rows is returned
    pub fn update<U: OrmUjo>(&mut self, ujo: &U) -> Result<usize> {
        let table = self.handler.table_of::<U>()?.clone();
        let (pk_sql, pk_params) = pk_condition(&table, pk_value(&table, ujo)?)?;
        let columns: Vec<&MetaColumn> = table.columns.iter().filter(|c| !c.pk).collect();
        if columns.is_empty() {
            return Ok(0);
        }

        let (set_sql, mut params) = assignments(&columns, ujo)?;
        params.extend(pk_params);
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.handler.dialect().table_name(&table),
            set_sql,
            pk_sql
        );
        self.execute(&sql, &params)
    }

    /// Update the columns of the keys in all rows matching the criterion
    ///
    /// An empty key list updates every column except the primary key.
    pub fn update_where<U: OrmUjo>(
        &mut self,
        ujo: &U,
        keys: &[AnyKey],
        criterion: &Criterion<U>,
    ) -> Result<usize> {
        let table = self.handler.table_of::<U>()?.clone();
        let columns: Vec<&MetaColumn> = if keys.is_empty() {
            table.columns.iter().filter(|c| !c.pk).collect()
        } else {
            keys.iter()
                .map(|key| table.column_required(key))
                .collect::<Result<_>>()?
        };
        if columns.is_empty() {
            return Ok(0);
        }

        let (set_sql, mut params) = assignments(&columns, ujo)?;
        let (where_sql, where_params) = self.restriction(&table, criterion)?;
        params.extend(where_params);
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.handler.dialect().table_name(&table),
            set_sql,
            where_sql
        );
        self.execute(&sql, &params)
    }

    /// Insert the object with a null primary key or a missing row, update it otherwise
    pub fn save_or_update<U: OrmUjo>(&mut self, ujo: &mut U) -> Result<()> {
        let table = self.handler.table_of::<U>()?.clone();
        if pk_value(&table, ujo)?.is_null() || self.update(ujo)? == 0 {
            self.insert(ujo)?;
        }
        Ok(())
    }

    /// Delete the row of the object by the primary key
    pub fn delete<U: OrmUjo>(&mut self, ujo: &U) -> Result<usize> {
        let table = self.handler.table_of::<U>()?.clone();
        let (pk_sql, params) = pk_condition(&table, pk_value(&table, ujo)?)?;
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.handler.dialect().table_name(&table),
            pk_sql
        );
        self.execute(&sql, &params)
    }

    /// Delete all rows matching the criterion
    pub fn delete_where<U: OrmUjo>(&mut self, criterion: &Criterion<U>) -> Result<usize> {
        let table = self.handler.table_of::<U>()?.clone();
        let (where_sql, params) = self.restriction(&table, criterion)?;
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.handler.dialect().table_name(&table),
            where_sql
        );
        self.execute(&sql, &params)
    }

    /// Load the object by the primary key, a composite key is a `Value::List`
    pub fn load<U: OrmUjo>(&self, pk: impl Into<Value>) -> Result<Option<U>> {
        let table = self.handler.table_of::<U>()?.clone();
        let pk = pk.into();
        if pk.is_null() {
            return Ok(None);
        }
        let (pk_sql, params) = pk_condition(&table, pk)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            select_list(&table),
            self.handler.dialect().table_name(&table),
            pk_sql
        );
        let mut rows = self.select::<U>(&sql, &params)?;
        Ok(rows.pop())
    }

    /// Query of the objects matching the criterion
    pub fn create_query<U: OrmUjo>(&self, criterion: Criterion<U>) -> Query<'_, U> {
        Query::new(self, criterion)
    }

    /// Reference stored in the relation key without loading the row
    pub fn read_fk<U: OrmUjo, R: OrmUjo>(&self, ujo: &U, key: &Key<U, R>) -> Option<ForeignKey> {
        ForeignKey::of(key, ujo)
    }

    /// Load the row of the reference
    pub fn load_fk<R: OrmUjo>(&self, fk: &ForeignKey) -> Result<Option<R>> {
        self.load::<R>(fk.value().clone())
    }

    /// Load the related object of the relation key
    pub fn load_related<U: OrmUjo, R: OrmUjo>(&self, ujo: &U, key: &Key<U, R>) -> Result<Option<R>> {
        match self.read_fk(ujo, key) {
            Some(fk) => self.load_fk(&fk),
            None => Ok(None),
        }
    }

    /// Commit the open transaction, a session marked for rollback rolls back
    pub fn commit(&mut self) -> Result<()> {
        if self.rollback_only {
            warn!("Session is marked for rollback, commit rolls back");
            return self.rollback();
        }
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
            debug!("Transaction committed");
        }
        Ok(())
    }

    /// Roll back the open transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.rollback_only = false;
        if self.in_transaction {
            self.in_transaction = false;
            self.conn.execute_batch("ROLLBACK")?;
            debug!("Transaction rolled back");
        }
        Ok(())
    }

    /// The next commit rolls back
    pub fn mark_for_rollback(&mut self) {
        self.rollback_only = true;
    }

    /// Close the session, an open transaction is rolled back
    pub fn close(mut self) -> Result<()> {
        if self.in_transaction {
            warn!("Session closed with an open transaction, rolling back");
            self.rollback()?;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn log_statement(&self, sql: &str, params: &[Value]) {
        if self.handler.config().log_sql {
            debug!("SQL: {} {:?}", sql, params);
        }
    }

    /// Execute a statement inside the transaction
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        self.begin()?;
        self.log_statement(sql, params);
        Ok(self.conn.execute(sql, params_from_iter(params_of(params)))?)
    }

    /// Condition of a criterion, joined tables are restricted by a sub-select
    fn restriction<U>(&self, table: &Arc<MetaTable>, criterion: &Criterion<U>) -> Result<(String, Vec<Value>)> {
        let decoded = CriterionDecoder::new(self.handler.model(), self.handler.dialect(), table.clone())
            .decode_criterion(criterion.node())?;
        if !decoded.has_joins() {
            return Ok((decoded.where_sql, decoded.params));
        }

        let pk: Vec<String> = table
            .pk_db_columns()
            .iter()
            .map(|db| format!("{}.{}", table.name, db.name))
            .collect();
        if pk.is_empty() {
            return Err(OrmError::Mapping(format!("Table {} has no primary key", table.name)));
        }
        let sql = format!(
            "({}) IN (SELECT {} FROM {} WHERE {})",
            pk.join(", "),
            pk.join(", "),
            decoded.tables.join(", "),
            decoded.where_sql
        );
        Ok((sql, decoded.params))
    }

    /// Read the objects of a `SELECT` of the table columns
    pub(crate) fn select<U: OrmUjo>(&self, sql: &str, params: &[Value]) -> Result<Vec<U>> {
        let table = self.handler.table_of::<U>()?.clone();
        self.log_statement(sql, params);
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params_of(params)))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(read_object::<U>(&table, row)?);
        }
        Ok(result)
    }

    /// Read one integer of a `SELECT`
    pub(crate) fn select_count(&self, sql: &str, params: &[Value]) -> Result<i64> {
        self.log_statement(sql, params);
        let count = self
            .conn
            .query_row(sql, params_from_iter(params_of(params)), |row| row.get(0))?;
        Ok(count)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("Session dropped with an open transaction, rolling back");
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                error!("Rollback failed: {}", e);
            }
        }
    }
}

/// Qualified columns of the table in the `SELECT` order
pub(crate) fn select_list(table: &MetaTable) -> String {
    table
        .db_columns()
        .map(|(_, db)| format!("{}.{}", table.name, db.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_object<U: OrmUjo>(table: &MetaTable, row: &Row<'_>) -> Result<U> {
    let mut ujo = U::new_instance();
    let mut index = 0;
    for column in &table.columns {
        let mut values = Vec::with_capacity(column.columns.len());
        for db in &column.columns {
            let value = value_from_ref(row.get_ref(index)?).coerce(db.db_type.value_type())?;
            values.push(value);
            index += 1;
        }
        let value = if column.is_composite() {
            if values.iter().all(Value::is_null) {
                Value::Null
            } else {
                Value::List(values)
            }
        } else {
            let value = values.pop().unwrap_or(Value::Null);
            if column.is_foreign() {
                value
            } else {
                value.coerce(column.key.value_type())?
            }
        };
        ujo.write_value(&column.key, value)?;
    }
    Ok(ujo)
}

/// Physical values of a column, a composite relation takes a list
fn flatten(column: &MetaColumn, value: Value) -> Result<Vec<Value>> {
    let count = column.columns.len();
    if count == 1 {
        return Ok(vec![value]);
    }
    match value {
        Value::Null => Ok(vec![Value::Null; count]),
        Value::List(items) if items.len() == count => Ok(items),
        other => Err(OrmError::Mapping(format!(
            "Column {} requires a list of {} values, not {}",
            column.name, count, other
        ))),
    }
}

fn assignments<U: Ujo>(columns: &[&MetaColumn], ujo: &U) -> Result<(String, Vec<Value>)> {
    let mut items = Vec::new();
    let mut params = Vec::new();
    for column in columns {
        items.extend(column.column_names().map(|name| format!("{} = ?", name)));
        params.extend(flatten(column, column.key.effective_value(ujo))?);
    }
    Ok((items.join(", "), params))
}

/// Primary key value of the object, a list for more primary key columns
fn pk_value<U: Ujo>(table: &MetaTable, ujo: &U) -> Result<Value> {
    let columns = table.pk_columns();
    match columns.as_slice() {
        [] => Err(OrmError::Mapping(format!("Table {} has no primary key", table.name))),
        [column] => Ok(column.key.effective_value(ujo)),
        columns => {
            let values: Vec<Value> = columns.iter().map(|c| c.key.effective_value(ujo)).collect();
            if values.iter().any(Value::is_null) {
                Ok(Value::Null)
            } else {
                Ok(Value::List(values))
            }
        }
    }
}

/// Condition `pk1 = ? AND pk2 = ?` of the primary key value
fn pk_condition(table: &MetaTable, pk: Value) -> Result<(String, Vec<Value>)> {
    if pk.is_null() {
        return Err(OrmError::Mapping(format!("Primary key of {} is null", table.name)));
    }
    let columns = table.pk_db_columns();
    let params = match pk {
        Value::List(items) if columns.len() > 1 => items,
        value => vec![value],
    };
    if params.len() != columns.len() {
        return Err(OrmError::Mapping(format!(
            "Primary key of {} requires {} values",
            table.name,
            columns.len()
        )));
    }
    let items: Vec<String> = columns
        .iter()
        .map(|db| format!("{}.{} = ?", table.name, db.name))
        .collect();
    Ok((items.join(" AND "), params))
}
