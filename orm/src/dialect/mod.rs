//! SQL dialects
//!
//! A dialect prints the column types, the DDL statements, the criterion
//! templates and the row limits. Only the SQLite dialect is executed, the
//! other dialects produce statement text.

mod ansi;
mod postgres;
mod sqlite;

pub use ansi::AnsiDialect;
pub use postgres::PostgreSqlDialect;
pub use sqlite::SqliteDialect;

use std::fmt::Debug;
use std::sync::Arc;

use ujorm_core::Operator;

use crate::config::DialectKind;
use crate::error::{OrmError, Result};
use crate::meta::{DbColumn, MetaColumn, MetaIndex, MetaTable};

/// Placeholder of the column in a criterion template
pub const COLUMN_PLACEHOLDER: &str = "{0}";

/// Placeholder of the bind parameters in a criterion template
pub const VALUE_PLACEHOLDER: &str = "{1}";

/// SQL printing of one database product
pub trait SqlDialect: Debug + Send + Sync {
    /// Kind of the dialect
    fn kind(&self) -> DialectKind;

    /// Type name of a physical column
    fn type_name(&self, column: &DbColumn) -> String;

    /// Template of the regular expression operator
    fn regexp_template(&self, negated: bool) -> Result<&'static str>;

    /// Suffix of a column with a generated integer value
    fn generated_suffix(&self) -> &'static str {
        ""
    }

    /// Table name including the schema
    fn table_name(&self, table: &MetaTable) -> String {
        match &table.schema {
            Some(schema) => format!("{}.{}", schema, table.name),
            None => table.name.clone(),
        }
    }

    /// Append the row limit and offset to a `SELECT`
    fn print_limit(&self, sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }

    /// Template of a value operator where `{0}` is the column and `{1}` the parameters
    fn criterion_template(&self, operator: Operator) -> Result<&'static str> {
        let template = match operator {
            Operator::Eq | Operator::EqualsCaseInsensitive => "{0} = {1}",
            Operator::NotEq => "{0} <> {1}",
            Operator::Gt => "{0} > {1}",
            Operator::Ge => "{0} >= {1}",
            Operator::Lt => "{0} < {1}",
            Operator::Le => "{0} <= {1}",
            Operator::Starts
            | Operator::StartsCaseInsensitive
            | Operator::Ends
            | Operator::EndsCaseInsensitive
            | Operator::Contains
            | Operator::ContainsCaseInsensitive => "{0} LIKE {1} ESCAPE '\\'",
            Operator::In => "{0} IN ({1})",
            Operator::NotIn => "{0} NOT IN ({1})",
            Operator::Regexp => return self.regexp_template(false),
            Operator::NotRegexp => return self.regexp_template(true),
            Operator::XFixed | Operator::XSql => {
                return Err(OrmError::Unsupported(format!(
                    "Operator {} has no template",
                    operator
                )))
            }
        };
        Ok(template)
    }

    /// Column definition used by `CREATE TABLE` and `ADD COLUMN`
    fn column_definition(&self, table: &MetaTable, column: &MetaColumn, db: &DbColumn, not_null: bool) -> String {
        let mut result = format!("{} {}", db.name, self.type_name(db));
        if table.is_generated(column) {
            result.push_str(self.generated_suffix());
        } else if not_null && column.mandatory {
            result.push_str(" NOT NULL");
        }
        result
    }

    /// `CREATE TABLE` statement with the primary and foreign keys
    fn create_table(&self, table: &MetaTable) -> String {
        let mut items: Vec<String> = table
            .db_columns()
            .map(|(column, db)| self.column_definition(table, column, db, true))
            .collect();

        let pk: Vec<&str> = table.pk_db_columns().iter().map(|db| db.name.as_str()).collect();
        if !pk.is_empty() {
            items.push(format!("PRIMARY KEY ({})", pk.join(", ")));
        }
        for column in table.columns.iter().filter(|column| column.is_foreign()) {
            if let Some(foreign) = &column.foreign {
                let names: Vec<&str> = column.column_names().collect();
                items.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    names.join(", "),
                    foreign.table,
                    foreign.columns.join(", ")
                ));
            }
        }

        format!("CREATE TABLE {} (\n  {}\n)", self.table_name(table), items.join(",\n  "))
    }

    /// `ALTER TABLE .. ADD COLUMN` statement, the column is nullable
    fn add_column(&self, table: &MetaTable, column: &MetaColumn, db: &DbColumn) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.table_name(table),
            self.column_definition(table, column, db, false)
        )
    }

    /// `CREATE [UNIQUE] INDEX` statement
    fn create_index(&self, table: &MetaTable, index: &MetaIndex) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            index.name,
            self.table_name(table),
            index.columns.join(", ")
        )
    }

    /// Statements adding the table and column comments
    fn comment_statements(&self, _table: &MetaTable) -> Vec<String> {
        Vec::new()
    }
}

/// Dialect of the kind
pub fn dialect_of(kind: DialectKind) -> Arc<dyn SqlDialect> {
    match kind {
        DialectKind::Sqlite => Arc::new(SqliteDialect),
        DialectKind::PostgreSql => Arc::new(PostgreSqlDialect),
        DialectKind::Ansi => Arc::new(AnsiDialect),
    }
}

fn sized(name: &str, column: &DbColumn) -> String {
    match column.length {
        Some(length) => format!("{}({})", name, length),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaModel;
    use crate::schema::Orm2ddlPolicy;
    use crate::test_domain::{City, Person, Room};
    use sqlparser::dialect::{GenericDialect, PostgreSqlDialect as PgParser, SQLiteDialect};
    use sqlparser::parser::Parser;

    fn model() -> MetaModel {
        MetaModel::build(
            vec![
                City::table_model().into_spec(),
                Person::table_model().comment("Persons").into_spec(),
            ],
            Orm2ddlPolicy::CreateDdl,
        )
        .unwrap()
    }

    #[test]
    fn test_sqlite_create_table() {
        let model = model();
        let person = model.table_of::<Person>().unwrap();
        let sql = SqliteDialect.create_table(person);
        assert_eq!(
            sql,
            "CREATE TABLE person (\n  id INTEGER,\n  name VARCHAR(64),\n  cash REAL,\n  \
             code VARCHAR(10),\n  city_id INTEGER,\n  PRIMARY KEY (id),\n  \
             FOREIGN KEY (city_id) REFERENCES city (id)\n)"
        );
        Parser::parse_sql(&SQLiteDialect {}, &sql).unwrap();

        let index = SqliteDialect.create_index(person, &person.indexes[0]);
        assert_eq!(index, "CREATE UNIQUE INDEX uq_person_code ON person (code)");
        Parser::parse_sql(&SQLiteDialect {}, &index).unwrap();
    }

    #[test]
    fn test_postgres_statements() {
        let model = model();
        let person = model.table_of::<Person>().unwrap();
        let sql = PostgreSqlDialect.create_table(person);
        assert!(sql.contains("id BIGINT GENERATED BY DEFAULT AS IDENTITY"));
        assert!(sql.contains("cash DOUBLE PRECISION"));

        let column = person.column(Person::keys().name.untyped()).unwrap();
        let add = PostgreSqlDialect.add_column(person, column, &column.columns[0]);
        assert_eq!(add, "ALTER TABLE person ADD COLUMN name VARCHAR(64)");
        Parser::parse_sql(&PgParser {}, &add).unwrap();

        let comments = PostgreSqlDialect.comment_statements(person);
        assert_eq!(comments, vec!["COMMENT ON TABLE person IS 'Persons'"]);
    }

    #[test]
    fn test_composite_pk_has_no_identity() {
        let model = MetaModel::build(vec![Room::table_model().into_spec()], Orm2ddlPolicy::CreateDdl).unwrap();
        let room = model.table_of::<Room>().unwrap();
        let sql = PostgreSqlDialect.create_table(room);
        assert!(!sql.contains("IDENTITY"));
        assert!(sql.contains("building INTEGER NOT NULL"));
        assert!(sql.contains("number INTEGER NOT NULL"));
        Parser::parse_sql(&PgParser {}, &sql).unwrap();
    }

    #[test]
    fn test_limits() {
        let mut sql = String::from("SELECT id FROM person");
        SqliteDialect.print_limit(&mut sql, None, Some(5));
        assert_eq!(sql, "SELECT id FROM person LIMIT -1 OFFSET 5");

        let mut sql = String::from("SELECT id FROM person");
        PostgreSqlDialect.print_limit(&mut sql, Some(10), Some(5));
        assert_eq!(sql, "SELECT id FROM person LIMIT 10 OFFSET 5");
        Parser::parse_sql(&PgParser {}, &sql).unwrap();

        let mut sql = String::from("SELECT id FROM person");
        AnsiDialect.print_limit(&mut sql, Some(10), Some(5));
        assert_eq!(sql, "SELECT id FROM person OFFSET 5 ROWS FETCH FIRST 10 ROWS ONLY");
        Parser::parse_sql(&GenericDialect {}, &sql).unwrap();
    }

    #[test]
    fn test_templates() {
        assert_eq!(SqliteDialect.criterion_template(Operator::Ge).unwrap(), "{0} >= {1}");
        assert_eq!(SqliteDialect.criterion_template(Operator::NotRegexp).unwrap(), "{0} NOT REGEXP {1}");
        assert_eq!(PostgreSqlDialect.criterion_template(Operator::Regexp).unwrap(), "{0} ~ {1}");
        assert!(matches!(
            AnsiDialect.criterion_template(Operator::Regexp),
            Err(OrmError::Unsupported(_))
        ));
        assert!(SqliteDialect.criterion_template(Operator::XSql).is_err());
        assert_eq!(dialect_of(DialectKind::Ansi).kind(), DialectKind::Ansi);
    }
}
