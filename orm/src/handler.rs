//! ORM handler
//!
//! The handler owns the meta-model and the database location. It is built
//! once, applies the DDL policy, and then opens sessions.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex};

use log::{debug, info};
use rusqlite::Connection;

use crate::config::{DialectKind, OrmConfig};
use crate::dialect::{dialect_of, SqlDialect};
use crate::error::{OrmError, Result};
use crate::meta::{MetaModel, MetaTable, OrmUjo, TableModel, TableSpec};
use crate::schema::{plan_ddl, DbSchema, DdlStatement, SchemaReader};
use crate::session::Session;
use crate::sqlite;

/// Builder of the ORM handler
#[derive(Debug)]
pub struct OrmHandlerBuilder {
    config: OrmConfig,
    specs: Vec<TableSpec>,
}

impl OrmHandlerBuilder {
    /// Register the table of a domain type
    pub fn register<U: OrmUjo>(mut self, model: TableModel<U>) -> Self {
        self.specs.push(model.into_spec());
        self
    }

    /// Statements creating the whole schema in the configured dialect
    ///
    /// No database is opened, so the PostgreSQL and ANSI dialects may be used.
    pub fn create_script(&self) -> Result<Vec<DdlStatement>> {
        let model = MetaModel::build(self.specs.clone(), self.config.ddl_policy)?;
        let dialect = dialect_of(self.config.dialect);
        plan_ddl(&model, &DbSchema::default(), dialect.as_ref())
    }

    /// Resolve the meta-model, open the database and apply the DDL policy
    pub fn build(self) -> Result<OrmHandler> {
        self.config.validate()?;
        if self.config.dialect != DialectKind::Sqlite {
            return Err(OrmError::Config(format!(
                "Dialect {:?} prints statements only, the executed dialect is Sqlite",
                self.config.dialect
            )));
        }

        let model = MetaModel::build(self.specs, self.config.ddl_policy)?;
        let dialect = dialect_of(self.config.dialect);
        let path = sqlite::database_path(&self.config.database);
        let mut conn = sqlite::open(&path, &self.config.database)?;
        let applied = apply_ddl(&mut conn, &model, dialect.as_ref())?;

        info!(
            "ORM handler started: {} tables, {} DDL statements, database {}",
            model.tables().len(),
            applied,
            self.config.database.url
        );

        // A shared memory database lives while one connection is open
        let keeper = if self.config.database.is_memory() {
            Some(Mutex::new(conn))
        } else {
            None
        };

        Ok(OrmHandler {
            inner: Arc::new(HandlerInner {
                config: self.config,
                model,
                dialect,
                path,
                _keeper: keeper,
            }),
        })
    }
}

fn apply_ddl(conn: &mut Connection, model: &MetaModel, dialect: &dyn SqlDialect) -> Result<usize> {
    let existing = SchemaReader::new(conn).read()?;
    let statements = plan_ddl(model, &existing, dialect)?;
    if statements.is_empty() {
        debug!("Database schema is up to date");
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for statement in &statements {
        info!("DDL: {}", statement.sql);
        tx.execute_batch(&statement.sql)?;
    }
    tx.commit()?;
    Ok(statements.len())
}

struct HandlerInner {
    config: OrmConfig,
    model: MetaModel,
    dialect: Arc<dyn SqlDialect>,
    path: String,
    _keeper: Option<Mutex<Connection>>,
}

/// Shared entry point of the persistence, cheap to clone
#[derive(Clone)]
pub struct OrmHandler {
    inner: Arc<HandlerInner>,
}

impl Debug for OrmHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OrmHandler")
            .field("url", &self.inner.config.database.url)
            .field("tables", &self.inner.model.tables().len())
            .finish()
    }
}

impl OrmHandler {
    /// Builder of a handler
    pub fn builder(config: OrmConfig) -> OrmHandlerBuilder {
        OrmHandlerBuilder {
            config,
            specs: Vec::new(),
        }
    }

    /// Configuration
    pub fn config(&self) -> &OrmConfig {
        &self.inner.config
    }

    /// Resolved meta-model
    pub fn model(&self) -> &MetaModel {
        &self.inner.model
    }

    /// Dialect of the statements
    pub fn dialect(&self) -> &dyn SqlDialect {
        self.inner.dialect.as_ref()
    }

    /// Table of the domain type
    pub fn table_of<U: 'static>(&self) -> Result<&Arc<MetaTable>> {
        self.inner.model.table_of::<U>()
    }

    /// Open a new session with its own connection
    pub fn session(&self) -> Result<Session> {
        let conn = sqlite::open(&self.inner.path, &self.inner.config.database)?;
        Ok(Session::new(self.clone(), conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Orm2ddlPolicy;
    use crate::test_domain::{City, Person};
    use tempfile::TempDir;

    fn builder(config: OrmConfig) -> OrmHandlerBuilder {
        OrmHandler::builder(config)
            .register(City::table_model())
            .register(Person::table_model())
    }

    #[test]
    fn test_memory_database_is_shared() {
        let handler = builder(OrmConfig::testing()).build().unwrap();
        let first = handler.session().unwrap();
        let second = handler.session().unwrap();
        let count = |session: &Session| -> i64 {
            session
                .connection()
                .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |r| r.get(0))
                .unwrap()
        };
        assert_eq!(count(&first), 2);
        assert_eq!(count(&second), 2);

        let other = builder(OrmConfig::testing()).build().unwrap();
        assert_eq!(other.table_of::<Person>().unwrap().name, "person");
    }

    #[test]
    fn test_ddl_policies_on_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let url = dir.path().join("ujorm.db").to_string_lossy().into_owned();

        let mut config = OrmConfig::with_url(url.clone());
        config.ddl_policy = Orm2ddlPolicy::Validate;
        assert!(matches!(builder(config.clone()).build(), Err(OrmError::Schema(_))));

        config.ddl_policy = Orm2ddlPolicy::CreateDdl;
        builder(config.clone()).build()?;

        config.ddl_policy = Orm2ddlPolicy::Validate;
        let handler = builder(config.clone()).build()?;
        assert_eq!(handler.config().database.url, url);

        // The label column is added to the existing table
        let conn = Connection::open(&url)?;
        conn.execute_batch("CREATE TABLE room (building INTEGER, number INTEGER, PRIMARY KEY (building, number))")?;
        drop(conn);
        config.ddl_policy = Orm2ddlPolicy::CreateOrUpdateDdl;
        let handler = OrmHandler::builder(config)
            .register(crate::test_domain::Room::table_model())
            .build()?;
        let session = handler.session()?;
        let columns: i64 = session.connection().query_row(
            "SELECT COUNT(*) FROM pragma_table_info('room')",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(columns, 3);
        Ok(())
    }

    #[test]
    fn test_statement_dialects() {
        let mut config = OrmConfig::testing();
        config.dialect = DialectKind::PostgreSql;
        assert!(matches!(builder(config.clone()).build(), Err(OrmError::Config(_))));

        let script = builder(config).create_script().unwrap();
        assert!(script[1].sql.contains("id BIGINT GENERATED BY DEFAULT AS IDENTITY"));
    }
}
