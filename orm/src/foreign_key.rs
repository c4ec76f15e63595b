//! Reference to a row of a related table

use std::fmt::{Display, Formatter, Result as FmtResult};

use ujorm_core::criterion::{Operand, ValueCriterion};
use ujorm_core::{Criterion, Key, Operator, Ujo, Value};

use crate::error::Result;

/// Primary key value of a relation that is not loaded
///
/// A composite primary key is kept as `Value::List` in the order of the
/// primary key columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey(Value);

impl ForeignKey {
    /// Reference of the primary key value
    pub fn new(value: impl Into<Value>) -> Self {
        ForeignKey(value.into())
    }

    /// Reference stored in the relation key of the object
    pub fn of<U: Ujo, R: Ujo>(key: &Key<U, R>, ujo: &U) -> Option<Self> {
        let value = key.reference(ujo);
        if value.is_null() {
            None
        } else {
            Some(ForeignKey(value))
        }
    }

    /// Primary key value
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consume the reference
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Is the reference empty
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Criterion selecting the objects referencing this row by the relation key
    pub fn criterion<U, R>(&self, key: &Key<U, R>) -> Result<Criterion<U>> {
        let leaf = ValueCriterion::new(Some(key.path()), Operator::Eq, Operand::Value(self.0.clone()))?;
        Ok(leaf.into())
    }
}

impl Display for ForeignKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "FK[{}]", self.0)
    }
}

impl From<Value> for ForeignKey {
    fn from(value: Value) -> Self {
        ForeignKey(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::OrmUjo;
    use crate::test_domain::Person;

    #[test]
    fn test_reference_of_object() {
        let keys = Person::keys();
        let mut person = Person::new_instance();
        assert_eq!(ForeignKey::of(&keys.city, &person), None);

        keys.city.set_reference(&mut person, 5i64).unwrap();
        let fk = ForeignKey::of(&keys.city, &person).unwrap();
        assert_eq!(fk.value(), &Value::BigInt(5));
        assert_eq!(fk.to_string(), "FK[5]");
        assert!(fk.criterion(&keys.city).unwrap().evaluate(&person).unwrap());
        assert!(!ForeignKey::new(6i64).criterion(&keys.city).unwrap().evaluate(&person).unwrap());

        let criterion = ForeignKey::new(Value::Null).criterion(&keys.city).unwrap();
        assert!(!criterion.evaluate(&person).unwrap());
        assert!(criterion.evaluate(&Person::new_instance()).unwrap());
    }
}
