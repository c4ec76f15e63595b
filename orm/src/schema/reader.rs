//! Reader of an existing SQLite schema

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;

use crate::error::Result;

/// Existing table with its column names
#[derive(Debug, Clone, Default)]
pub struct DbTable {
    /// Table name
    pub name: String,

    columns: HashSet<String>,
}

impl DbTable {
    /// Does the column exist, case insensitive
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(&name.to_lowercase())
    }

    /// Column count
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Tables and indexes found in a database
#[derive(Debug, Clone, Default)]
pub struct DbSchema {
    tables: HashMap<String, DbTable>,
    indexes: HashSet<String>,
}

impl DbSchema {
    /// Table of the name, case insensitive
    pub fn table(&self, name: &str) -> Option<&DbTable> {
        self.tables.get(&name.to_lowercase())
    }

    /// Does the table exist
    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Does the index exist
    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains(&name.to_lowercase())
    }

    /// Has the database no table
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Add a table, used for statement planning without a database
    pub fn add_table<'a>(&mut self, name: &str, columns: impl IntoIterator<Item = &'a str>) {
        let table = DbTable {
            name: name.to_string(),
            columns: columns.into_iter().map(str::to_lowercase).collect(),
        };
        self.tables.insert(name.to_lowercase(), table);
    }

    /// Add an index name
    pub fn add_index(&mut self, name: &str) {
        self.indexes.insert(name.to_lowercase());
    }
}

/// Reader of the SQLite catalog
#[derive(Debug)]
pub struct SchemaReader<'c> {
    conn: &'c Connection,
}

impl<'c> SchemaReader<'c> {
    /// Reader of the connection
    pub fn new(conn: &'c Connection) -> Self {
        SchemaReader { conn }
    }

    /// Read the user tables, their columns and the index names
    pub fn read(&self) -> Result<DbSchema> {
        let mut schema = DbSchema::default();

        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite!_%' ESCAPE '!'",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut columns_stmt = self.conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        for name in names {
            let columns = columns_stmt
                .query_map([&name], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            schema.add_table(&name, columns.iter().map(String::as_str));
        }

        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index'")?;
        let indexes = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for index in indexes {
            schema.add_index(&index?);
        }

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Person (id INTEGER PRIMARY KEY, name TEXT);
             CREATE UNIQUE INDEX uq_person_name ON Person (name);
             CREATE TABLE city (id INTEGER PRIMARY KEY AUTOINCREMENT);",
        )
        .unwrap();

        let schema = SchemaReader::new(&conn).read().unwrap();
        let person = schema.table("person").unwrap();
        assert_eq!(person.name, "Person");
        assert!(person.has_column("NAME"));
        assert!(!person.has_column("cash"));
        assert_eq!(person.column_count(), 2);
        assert!(schema.has_table("city"));
        assert!(!schema.has_table("sqlite_sequence"));
        assert!(schema.has_index("UQ_PERSON_NAME"));
    }

    #[test]
    fn test_empty_schema() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = SchemaReader::new(&conn).read().unwrap();
        assert!(schema.is_empty());
    }
}
