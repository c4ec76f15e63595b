//! Table mapping of a domain type

use std::any::{type_name, TypeId};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use ujorm_core::{AnyKey, Key, KeyList};

use crate::error::{OrmError, Result};
use crate::schema::Orm2ddlPolicy;
use super::column::{Column, DbColumn, MetaColumn};
use super::OrmUjo;

/// Untyped mapping options of one table
#[derive(Debug, Clone)]
pub(crate) struct TableSpec {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub name: String,
    pub schema: Option<String>,
    pub policy: Orm2ddlPolicy,
    pub comment: Option<String>,
    pub keys: KeyList,
    pub columns: HashMap<AnyKey, Column>,
    pub transient: HashSet<AnyKey>,
    pub relations: HashMap<AnyKey, TypeId>,
}

/// Mapping of the domain type `U` to a database table
///
/// Every key is mapped to a column by default. A relation key must be
/// declared by `relation()` or excluded by `transient()`.
#[derive(Debug, Clone)]
pub struct TableModel<U> {
    spec: TableSpec,
    _marker: PhantomData<fn(&U)>,
}

impl<U: OrmUjo> TableModel<U> {
    /// Mapping of the domain type to the table of the name
    pub fn new(name: &str) -> Self {
        let keys = U::new_instance().read_keys().clone();
        TableModel {
            spec: TableSpec {
                type_id: TypeId::of::<U>(),
                type_name: type_name::<U>(),
                name: name.to_string(),
                schema: None,
                policy: Orm2ddlPolicy::Inherited,
                comment: None,
                keys,
                columns: HashMap::new(),
                transient: HashSet::new(),
                relations: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Database schema of the table
    pub fn schema(mut self, schema: &str) -> Self {
        self.spec.schema = Some(schema.to_string());
        self
    }

    /// DDL policy of the table
    pub fn ddl_policy(mut self, policy: Orm2ddlPolicy) -> Self {
        self.spec.policy = policy;
        self
    }

    /// Table comment
    pub fn comment(mut self, comment: &str) -> Self {
        self.spec.comment = Some(comment.to_string());
        self
    }

    /// Column options of a key
    pub fn column<V>(mut self, key: &Key<U, V>, column: Column) -> Self {
        self.spec.columns.insert(key.untyped().clone(), column);
        self
    }

    /// Exclude the key from the persistence
    pub fn transient<V>(mut self, key: &Key<U, V>) -> Self {
        self.spec.transient.insert(key.untyped().clone());
        self
    }

    /// Relation key referencing the primary key of the table of `R`
    pub fn relation<R: OrmUjo>(mut self, key: &Key<U, R>, column: Column) -> Self {
        self.spec.columns.insert(key.untyped().clone(), column);
        self.spec.relations.insert(key.untyped().clone(), TypeId::of::<R>());
        self
    }

    pub(crate) fn into_spec(self) -> TableSpec {
        self.spec
    }
}

/// Database index of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaIndex {
    /// Index name
    pub name: String,

    /// Is the index unique
    pub unique: bool,

    /// Physical column names
    pub columns: Vec<String>,
}

/// Resolved table of a domain type
#[derive(Debug, Clone)]
pub struct MetaTable {
    /// Type of the domain
    pub type_id: TypeId,

    /// Type name of the domain
    pub type_name: &'static str,

    /// Table name
    pub name: String,

    /// Database schema
    pub schema: Option<String>,

    /// Resolved DDL policy
    pub policy: Orm2ddlPolicy,

    /// Table comment
    pub comment: Option<String>,

    /// Keys of the domain
    pub keys: KeyList,

    /// Persistent columns in the key order
    pub columns: Vec<MetaColumn>,

    /// Indexes in the declaration order
    pub indexes: Vec<MetaIndex>,

    by_key: HashMap<AnyKey, usize>,
}

impl MetaTable {
    pub(crate) fn new(spec: &TableSpec, policy: Orm2ddlPolicy, columns: Vec<MetaColumn>) -> Self {
        let by_key = columns
            .iter()
            .enumerate()
            .map(|(i, column)| (column.key.clone(), i))
            .collect();
        let indexes = Self::collect_indexes(&spec.columns, &columns);
        MetaTable {
            type_id: spec.type_id,
            type_name: spec.type_name,
            name: spec.name.clone(),
            schema: spec.schema.clone(),
            policy,
            comment: spec.comment.clone(),
            keys: spec.keys.clone(),
            columns,
            indexes,
            by_key,
        }
    }

    fn collect_indexes(options: &HashMap<AnyKey, Column>, columns: &[MetaColumn]) -> Vec<MetaIndex> {
        let mut indexes: Vec<MetaIndex> = Vec::new();
        for column in columns {
            let Some(option) = options.get(&column.key) else {
                continue;
            };
            let named = [(option.index.as_ref(), false), (option.unique_index.as_ref(), true)];
            for (name, unique) in named {
                let Some(name) = name else {
                    continue;
                };
                let names = column.column_names().map(str::to_string);
                match indexes.iter_mut().find(|index| &index.name == name) {
                    Some(index) => {
                        index.unique |= unique;
                        index.columns.extend(names);
                    }
                    None => indexes.push(MetaIndex {
                        name: name.clone(),
                        unique,
                        columns: names.collect(),
                    }),
                }
            }
        }
        indexes
    }

    /// Column of the key
    pub fn column(&self, key: &AnyKey) -> Option<&MetaColumn> {
        self.by_key.get(key).map(|i| &self.columns[*i])
    }

    /// Column of the key or a mapping error
    pub fn column_required(&self, key: &AnyKey) -> Result<&MetaColumn> {
        self.column(key).ok_or_else(|| {
            OrmError::Mapping(format!("Key '{}' has no column in the table {}", key, self.name))
        })
    }

    /// Primary key columns
    pub fn pk_columns(&self) -> Vec<&MetaColumn> {
        self.columns.iter().filter(|column| column.pk).collect()
    }

    /// Has the table a primary key
    pub fn has_pk(&self) -> bool {
        self.columns.iter().any(|column| column.pk)
    }

    /// All physical columns with their key column
    pub fn db_columns(&self) -> impl Iterator<Item = (&MetaColumn, &DbColumn)> {
        self.columns
            .iter()
            .flat_map(|column| column.columns.iter().map(move |db| (column, db)))
    }

    /// Primary key column generated by the database on insert
    ///
    /// Only the single integer primary key of a table is generated, parts of
    /// a composite primary key never are.
    pub fn generated_column(&self) -> Option<&MetaColumn> {
        match self.pk_columns().as_slice() {
            [column] if column.is_integer() => Some(*column),
            _ => None,
        }
    }

    /// Is the column generated by the database on insert
    pub fn is_generated(&self, column: &MetaColumn) -> bool {
        self.generated_column().map_or(false, |generated| generated.key == column.key)
    }

    /// Physical primary key columns
    pub fn pk_db_columns(&self) -> Vec<&DbColumn> {
        self.columns
            .iter()
            .filter(|column| column.pk)
            .flat_map(|column| column.columns.iter())
            .collect()
    }

    /// Is the table the mapping of the domain type `U`
    pub fn is_mapping_of<U: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<U>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaModel;
    use crate::test_domain::{City, Person};

    #[test]
    fn test_default_mapping() {
        let model = MetaModel::build(
            vec![
                City::table_model().into_spec(),
                Person::table_model().into_spec(),
            ],
            Orm2ddlPolicy::CreateOrUpdateDdl,
        )
        .unwrap();

        let table = model.table_of::<Person>().unwrap();
        assert!(table.is_mapping_of::<Person>());
        let names: Vec<&str> = table.db_columns().map(|(_, db)| db.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "cash", "code", "city_id"]);
        assert_eq!(table.pk_columns().len(), 1);
        assert_eq!(table.generated_column().unwrap().name, "id");
        assert_eq!(table.policy, Orm2ddlPolicy::CreateOrUpdateDdl);

        let city = table.column(Person::keys().city.untyped()).unwrap();
        assert!(city.is_foreign());
        assert_eq!(city.foreign.as_ref().unwrap().table, "city");

        assert_eq!(table.indexes.len(), 1);
        assert!(table.indexes[0].unique);
        assert_eq!(table.indexes[0].columns, vec!["code"]);
    }
}
