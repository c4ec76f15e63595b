//! Column mapping of a key

use serde::{Deserialize, Serialize};
use ujorm_core::{AnyKey, ValueType};

/// Default length of a `VARCHAR` column
pub const DEFAULT_VARCHAR_LENGTH: u32 = 128;

/// Database type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    /// Integer (32-bit)
    Integer,
    /// Big integer (64-bit)
    BigInt,
    /// Floating point (64-bit)
    Double,
    /// Text of a limited length
    VarChar,
    /// Text of a fixed length
    Char,
    /// Text of an unlimited length
    Text,
    /// Binary data
    Blob,
    /// Boolean
    Boolean,
    /// UUID
    Uuid,
    /// Timestamp
    Timestamp,
    /// JSON document
    Json,
}

impl DbType {
    /// Database type derived from the key type
    pub fn from_value_type(value_type: ValueType) -> Option<DbType> {
        match value_type {
            ValueType::Integer => Some(DbType::Integer),
            ValueType::BigInt => Some(DbType::BigInt),
            ValueType::Float => Some(DbType::Double),
            ValueType::Text => Some(DbType::VarChar),
            ValueType::Binary => Some(DbType::Blob),
            ValueType::Boolean => Some(DbType::Boolean),
            ValueType::Uuid => Some(DbType::Uuid),
            ValueType::Timestamp => Some(DbType::Timestamp),
            ValueType::Json => Some(DbType::Json),
            ValueType::List | ValueType::Relation | ValueType::Null => None,
        }
    }

    /// Key type of the values read from the column
    pub fn value_type(&self) -> ValueType {
        match self {
            DbType::Integer => ValueType::Integer,
            DbType::BigInt => ValueType::BigInt,
            DbType::Double => ValueType::Float,
            DbType::VarChar | DbType::Char | DbType::Text => ValueType::Text,
            DbType::Blob => ValueType::Binary,
            DbType::Boolean => ValueType::Boolean,
            DbType::Uuid => ValueType::Uuid,
            DbType::Timestamp => ValueType::Timestamp,
            DbType::Json => ValueType::Json,
        }
    }

    /// Integer types may be generated by the database
    pub fn is_integer(&self) -> bool {
        matches!(self, DbType::Integer | DbType::BigInt)
    }

    /// Length used when the column declares none
    pub fn default_length(&self) -> Option<u32> {
        match self {
            DbType::VarChar => Some(DEFAULT_VARCHAR_LENGTH),
            DbType::Char => Some(1),
            _ => None,
        }
    }
}

/// Mapping options of a key column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    /// Column name, the snake case key name by default
    pub name: Option<String>,

    /// Is the column a part of the primary key
    pub pk: bool,

    /// Is the value required
    pub mandatory: bool,

    /// Database type, derived from the key type by default
    pub db_type: Option<DbType>,

    /// Length of text columns
    pub length: Option<u32>,

    /// Name of a non-unique index, columns sharing the name form one index
    pub index: Option<String>,

    /// Name of a unique index, columns sharing the name form one index
    pub unique_index: Option<String>,

    /// Column comment
    pub comment: Option<String>,
}

impl Column {
    /// Column with the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Column of the name
    pub fn named(name: &str) -> Self {
        Column {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Primary key column, it is mandatory
    pub fn pk(mut self) -> Self {
        self.pk = true;
        self.mandatory = true;
        self
    }

    /// Mandatory column
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Database type
    pub fn db_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    /// Text length
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Non-unique index
    pub fn index(mut self, name: &str) -> Self {
        self.index = Some(name.to_string());
        self
    }

    /// Unique index
    pub fn unique_index(mut self, name: &str) -> Self {
        self.unique_index = Some(name.to_string());
        self
    }

    /// Comment
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// One physical column of the database table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbColumn {
    /// Column name
    pub name: String,

    /// Database type
    pub db_type: DbType,

    /// Text length
    pub length: Option<u32>,
}

/// Reference of a relation column to the primary key of the target table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignRef {
    /// Name of the target table
    pub table: String,

    /// Primary key columns of the target table, one for every physical column
    pub columns: Vec<String>,
}

/// Resolved column of a key
#[derive(Debug, Clone)]
pub struct MetaColumn {
    /// Mapped key
    pub key: AnyKey,

    /// Logical column name
    pub name: String,

    /// Physical columns, more than one for a relation to a composite key
    pub columns: Vec<DbColumn>,

    /// Is the column a part of the primary key
    pub pk: bool,

    /// Is the value required
    pub mandatory: bool,

    /// Column comment
    pub comment: Option<String>,

    /// Target of a relation column
    pub foreign: Option<ForeignRef>,
}

impl MetaColumn {
    /// Is the column a relation to another table
    pub fn is_foreign(&self) -> bool {
        self.foreign.is_some()
    }

    /// Is the relation stored in more physical columns
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    /// Names of the physical columns
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Is the column one integer column that is not a relation
    pub fn is_integer(&self) -> bool {
        !self.is_foreign()
            && !self.is_composite()
            && self.columns.first().map_or(false, |c| c.db_type.is_integer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mapping() {
        assert_eq!(DbType::from_value_type(ValueType::Text), Some(DbType::VarChar));
        assert_eq!(DbType::from_value_type(ValueType::Relation), None);
        assert_eq!(DbType::Char.value_type(), ValueType::Text);
        assert_eq!(DbType::VarChar.default_length(), Some(DEFAULT_VARCHAR_LENGTH));
        assert!(DbType::BigInt.is_integer());
    }

    #[test]
    fn test_column_builder() {
        let column = Column::named("code").unique_index("uq_code").length(10);
        assert_eq!(column.name.as_deref(), Some("code"));
        assert_eq!(column.unique_index.as_deref(), Some("uq_code"));
        assert_eq!(column.length, Some(10));
        assert!(!column.pk);

        let pk = Column::new().pk();
        assert!(pk.pk && pk.mandatory);
    }
}
