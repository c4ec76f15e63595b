//! Meta-model of the mapped tables
//!
//! Every registered `TableModel` is resolved into a `MetaTable`. Relation
//! keys are resolved against the primary key of their target table in a
//! second pass, so the registration order does not matter.

mod column;
mod table;

pub use column::{Column, DbColumn, DbType, ForeignRef, MetaColumn, DEFAULT_VARCHAR_LENGTH};
pub use table::{MetaIndex, MetaTable, TableModel};
pub(crate) use table::TableSpec;

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};
use ujorm_core::utils::StringUtils;
use ujorm_core::{AnyKey, Ujo};

use crate::error::{OrmError, Result};
use crate::schema::Orm2ddlPolicy;

/// Domain type persisted by the ORM
pub trait OrmUjo: Ujo + Sized + 'static {
    /// Empty instance, rows are read into it
    fn new_instance() -> Self;
}

/// Resolved tables of one handler
#[derive(Debug, Clone, Default)]
pub struct MetaModel {
    tables: Vec<Arc<MetaTable>>,
    by_type: HashMap<TypeId, usize>,
}

enum Slot {
    Resolved(MetaColumn),
    Relation(AnyKey, Column, TypeId),
}

impl MetaModel {
    /// Resolve the table specifications
    pub(crate) fn build(specs: Vec<TableSpec>, default_policy: Orm2ddlPolicy) -> Result<Self> {
        Self::check_specs(&specs)?;
        let by_type: HashMap<TypeId, usize> = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.type_id, i))
            .collect();

        let slots = specs
            .iter()
            .map(Self::resolve_plain)
            .collect::<Result<Vec<_>>>()?;

        let mut tables = Vec::with_capacity(specs.len());
        for (spec, table_slots) in specs.iter().zip(&slots) {
            let mut columns = Vec::with_capacity(table_slots.len());
            for slot in table_slots {
                match slot {
                    Slot::Resolved(column) => columns.push(column.clone()),
                    Slot::Relation(key, option, target) => {
                        let index = by_type.get(target).ok_or_else(|| {
                            OrmError::Mapping(format!(
                                "Relation {}.{} targets an unregistered type",
                                spec.name, key
                            ))
                        })?;
                        let target = &specs[*index];
                        columns.push(Self::resolve_relation(key, option, target, &slots[*index])?);
                    }
                }
            }
            let policy = spec.policy.resolve(default_policy);
            let table = MetaTable::new(spec, policy, columns);
            Self::validate_table(&table)?;
            debug!("Mapped {} to the table {}", table.type_name, table.name);
            tables.push(Arc::new(table));
        }

        Ok(MetaModel { tables, by_type })
    }

    fn check_specs(specs: &[TableSpec]) -> Result<()> {
        let mut names = HashSet::new();
        let mut types = HashSet::new();
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(OrmError::Mapping(format!("Table of {} has no name", spec.type_name)));
            }
            if !names.insert(spec.name.to_lowercase()) {
                return Err(OrmError::Mapping(format!("Table {} is registered twice", spec.name)));
            }
            if !types.insert(spec.type_id) {
                return Err(OrmError::Mapping(format!("Type {} is registered twice", spec.type_name)));
            }
            let foreign = spec
                .columns
                .keys()
                .chain(spec.transient.iter())
                .find(|key| !spec.keys.contains(key));
            if let Some(key) = foreign {
                return Err(OrmError::Mapping(format!(
                    "Key {} does not belong to the table {}",
                    key, spec.name
                )));
            }
        }
        Ok(())
    }

    fn resolve_plain(spec: &TableSpec) -> Result<Vec<Slot>> {
        let mut slots = Vec::with_capacity(spec.keys.len());
        for key in spec.keys.iter() {
            if spec.transient.contains(key) {
                continue;
            }
            let option = spec.columns.get(key).cloned().unwrap_or_default();
            if key.is_relation() {
                let target = spec.relations.get(key).ok_or_else(|| {
                    OrmError::Mapping(format!(
                        "Relation key {}.{} must be mapped by relation() or transient()",
                        spec.name, key
                    ))
                })?;
                slots.push(Slot::Relation(key.clone(), option, *target));
                continue;
            }
            let db_type = match option.db_type {
                Some(db_type) => db_type,
                None => DbType::from_value_type(key.value_type()).ok_or_else(|| {
                    OrmError::Mapping(format!(
                        "Key {}.{} of the type {} has no column type",
                        spec.name,
                        key,
                        key.value_type()
                    ))
                })?,
            };
            let name = option
                .name
                .clone()
                .unwrap_or_else(|| StringUtils::camel_to_snake(&key.name()));
            slots.push(Slot::Resolved(MetaColumn {
                key: key.clone(),
                columns: vec![DbColumn {
                    name: name.clone(),
                    db_type,
                    length: option.length.or_else(|| db_type.default_length()),
                }],
                name,
                pk: option.pk,
                mandatory: option.mandatory,
                comment: option.comment,
                foreign: None,
            }));
        }
        Ok(slots)
    }

    fn resolve_relation(
        key: &AnyKey,
        option: &Column,
        target: &TableSpec,
        target_slots: &[Slot],
    ) -> Result<MetaColumn> {
        let mut pk_columns = Vec::new();
        for slot in target_slots {
            match slot {
                Slot::Resolved(column) if column.pk => pk_columns.extend(column.columns.iter()),
                Slot::Relation(pk_key, pk_option, _) if pk_option.pk => {
                    return Err(OrmError::Unsupported(format!(
                        "Primary key {}.{} is a relation",
                        target.name, pk_key
                    )));
                }
                _ => {}
            }
        }
        if pk_columns.is_empty() {
            return Err(OrmError::Mapping(format!(
                "Relation {} targets the table {} without a primary key",
                key, target.name
            )));
        }

        let name = option
            .name
            .clone()
            .unwrap_or_else(|| StringUtils::camel_to_snake(&key.name()));
        let columns: Vec<DbColumn> = if pk_columns.len() == 1 {
            vec![DbColumn {
                name: name.clone(),
                ..pk_columns[0].clone()
            }]
        } else {
            pk_columns
                .iter()
                .map(|pk| DbColumn {
                    name: format!("{}_{}", name, pk.name),
                    ..(*pk).clone()
                })
                .collect()
        };

        Ok(MetaColumn {
            key: key.clone(),
            name,
            columns,
            pk: option.pk,
            mandatory: option.mandatory,
            comment: option.comment.clone(),
            foreign: Some(ForeignRef {
                table: target.name.clone(),
                columns: pk_columns.iter().map(|pk| pk.name.clone()).collect(),
            }),
        })
    }

    fn validate_table(table: &MetaTable) -> Result<()> {
        let mut names = HashSet::new();
        for (_, db) in table.db_columns() {
            if !StringUtils::is_identifier(&db.name) {
                return Err(OrmError::Mapping(format!(
                    "Column name '{}' of the table {} is not an identifier",
                    db.name, table.name
                )));
            }
            if !names.insert(db.name.to_lowercase()) {
                return Err(OrmError::Mapping(format!(
                    "Column {} already exists in the table {}",
                    db.name, table.name
                )));
            }
        }
        if !table.has_pk() {
            warn!("Table {} has no primary key, update and delete by key fail", table.name);
        }
        Ok(())
    }

    /// Tables in the registration order
    pub fn tables(&self) -> &[Arc<MetaTable>] {
        &self.tables
    }

    /// Table of the type id
    pub fn table_by_type(&self, type_id: TypeId) -> Option<&Arc<MetaTable>> {
        self.by_type.get(&type_id).map(|i| &self.tables[*i])
    }

    /// Table of the domain type `U`
    pub fn table_of<U: 'static>(&self) -> Result<&Arc<MetaTable>> {
        self.table_by_type(TypeId::of::<U>()).ok_or_else(|| {
            OrmError::Mapping(format!("Type {} is not mapped", std::any::type_name::<U>()))
        })
    }

    /// Table of the name, case insensitive
    pub fn table_by_name(&self, name: &str) -> Option<&Arc<MetaTable>> {
        self.tables.iter().find(|table| table.name.eq_ignore_ascii_case(name))
    }

    /// Table holding the key
    pub fn table_of_key(&self, key: &AnyKey) -> Option<&Arc<MetaTable>> {
        self.tables.iter().find(|table| table.keys.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_domain::{Booking, City, Person, Room};

    fn build(specs: Vec<TableSpec>) -> Result<MetaModel> {
        MetaModel::build(specs, Orm2ddlPolicy::CreateOrUpdateDdl)
    }

    #[test]
    fn test_relation_registered_before_target() {
        let model = build(vec![
            Person::table_model().into_spec(),
            City::table_model().into_spec(),
        ])
        .unwrap();
        assert_eq!(model.tables().len(), 2);
        assert!(model.table_by_name("PERSON").is_some());
        let key = Person::keys().city.untyped();
        assert_eq!(model.table_of_key(key).unwrap().name, "person");
    }

    #[test]
    fn test_composite_relation() {
        let model = build(vec![
            Room::table_model().into_spec(),
            Booking::table_model().into_spec(),
        ])
        .unwrap();
        let booking = model.table_of::<Booking>().unwrap();
        let room = booking.column(Booking::keys().room.untyped()).unwrap();
        assert!(room.is_composite());
        let names: Vec<&str> = room.column_names().collect();
        assert_eq!(names, vec!["room_building", "room_number"]);
        assert_eq!(room.foreign.as_ref().unwrap().columns, vec!["building", "number"]);
        let room_table = model.table_of::<Room>().unwrap();
        assert_eq!(room_table.pk_columns().len(), 2);
        assert!(room_table.generated_column().is_none());
        assert!(!room_table.is_generated(room_table.pk_columns()[0]));
        assert!(booking.generated_column().is_some());
    }

    #[test]
    fn test_unregistered_target() {
        let result = build(vec![Person::table_model().into_spec()]);
        assert!(matches!(result, Err(OrmError::Mapping(_))));
    }

    #[test]
    fn test_undeclared_relation() {
        let spec = TableModel::<Person>::new("person").into_spec();
        let result = build(vec![City::table_model().into_spec(), spec]);
        assert!(matches!(result, Err(OrmError::Mapping(_))));
    }

    #[test]
    fn test_duplicate_names() {
        let result = build(vec![
            City::table_model().into_spec(),
            TableModel::<Room>::new("CITY").into_spec(),
        ]);
        assert!(matches!(result, Err(OrmError::Mapping(_))));

        let keys = City::keys();
        let spec = TableModel::<City>::new("city")
            .column(&keys.name, Column::named("id"))
            .into_spec();
        assert!(matches!(build(vec![spec]), Err(OrmError::Mapping(_))));
    }

    #[test]
    fn test_transient_key() {
        let keys = Person::keys();
        let spec = Person::table_model().transient(&keys.cash).into_spec();
        let model = build(vec![City::table_model().into_spec(), spec]).unwrap();
        let table = model.table_of::<Person>().unwrap();
        assert!(table.column(keys.cash.untyped()).is_none());
        assert!(table.column_required(keys.cash.untyped()).is_err());
    }

    #[test]
    fn test_table_policy_overrides_default() {
        let spec = City::table_model().ddl_policy(Orm2ddlPolicy::DoNothing).into_spec();
        let model = build(vec![spec]).unwrap();
        assert_eq!(model.table_of::<City>().unwrap().policy, Orm2ddlPolicy::DoNothing);
    }
}
