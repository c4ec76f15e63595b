//! Criterion factory methods of keys and property paths

use crate::error::Result;
use crate::models::{Key, KeyPath, KeyValue, PropertyPath, TextValue, Value};
use super::operator::Operator;
use super::value_criterion::{Operand, ValueCriterion};
use super::Criterion;

fn leaf<U>(path: PropertyPath, operator: Operator, right: Operand) -> Result<Criterion<U>> {
    Ok(ValueCriterion::new(Some(path), operator, right)?.into())
}

/// Leaf of a `KeyValue` operand, `TextValue` bounds the text operators
fn value_leaf<U>(path: PropertyPath, operator: Operator, value: Value) -> Criterion<U> {
    ValueCriterion::trusted(path, operator, Operand::Value(value)).into()
}

/// Criterion factory of a key or a property path from the domain `U` to `V`
pub trait CriterionProvider<U, V: KeyValue> {
    /// Property path compared by the criteria
    fn criterion_path(&self) -> PropertyPath;

    /// Equal to the value
    fn for_eq(&self, value: V) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::Eq, value.into_value())
    }

    /// Not equal to the value, null values included
    fn for_neq(&self, value: V) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::NotEq, value.into_value())
    }

    /// Greater than the value
    fn for_gt(&self, value: V) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::Gt, value.into_value())
    }

    /// Greater or equal to the value
    fn for_ge(&self, value: V) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::Ge, value.into_value())
    }

    /// Less than the value
    fn for_lt(&self, value: V) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::Lt, value.into_value())
    }

    /// Less or equal to the value
    fn for_le(&self, value: V) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::Le, value.into_value())
    }

    /// One of the values, an empty list gives the constant `false`
    fn for_in<I>(&self, values: I) -> Criterion<U>
    where
        I: IntoIterator<Item = V>,
        Self: Sized,
    {
        let items: Vec<Value> = values.into_iter().map(KeyValue::into_value).collect();
        if items.is_empty() {
            return Criterion::constant(false);
        }
        ValueCriterion::trusted(self.criterion_path(), Operator::In, Operand::List(items)).into()
    }

    /// None of the values, an empty list gives the constant `true`
    fn for_not_in<I>(&self, values: I) -> Criterion<U>
    where
        I: IntoIterator<Item = V>,
        Self: Sized,
    {
        let items: Vec<Value> = values.into_iter().map(KeyValue::into_value).collect();
        if items.is_empty() {
            return Criterion::constant(true);
        }
        ValueCriterion::trusted(self.criterion_path(), Operator::NotIn, Operand::List(items)).into()
    }

    /// The value is null
    fn for_null(&self) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::Eq, Value::Null)
    }

    /// The value is not null
    fn for_not_null(&self) -> Criterion<U> {
        value_leaf(self.criterion_path(), Operator::NotEq, Value::Null)
    }

    /// Equal to the value of another key of the same object
    fn for_eq_key<P>(&self, other: &P) -> Criterion<U>
    where
        P: CriterionProvider<U, V>,
        Self: Sized,
    {
        ValueCriterion::trusted(
            self.criterion_path(),
            Operator::Eq,
            Operand::Path(other.criterion_path()),
        )
        .into()
    }

    /// Case insensitive text equality
    fn for_equals_ci(&self, value: &str) -> Criterion<U>
    where
        V: TextValue,
    {
        value_leaf(self.criterion_path(), Operator::EqualsCaseInsensitive, value.into())
    }

    /// Text prefix
    fn for_starts(&self, value: &str) -> Criterion<U>
    where
        V: TextValue,
    {
        value_leaf(self.criterion_path(), Operator::Starts, value.into())
    }

    /// Case insensitive text prefix
    fn for_starts_ci(&self, value: &str) -> Criterion<U>
    where
        V: TextValue,
    {
        value_leaf(self.criterion_path(), Operator::StartsCaseInsensitive, value.into())
    }

    /// Text suffix
    fn for_ends(&self, value: &str) -> Criterion<U>
    where
        V: TextValue,
    {
        value_leaf(self.criterion_path(), Operator::Ends, value.into())
    }

    /// Case insensitive text suffix
    fn for_ends_ci(&self, value: &str) -> Criterion<U>
    where
        V: TextValue,
    {
        value_leaf(self.criterion_path(), Operator::EndsCaseInsensitive, value.into())
    }

    /// The text contains the value
    fn for_contains(&self, value: &str) -> Criterion<U>
    where
        V: TextValue,
    {
        value_leaf(self.criterion_path(), Operator::Contains, value.into())
    }

    /// The text contains the value, case insensitive
    fn for_contains_ci(&self, value: &str) -> Criterion<U>
    where
        V: TextValue,
    {
        value_leaf(self.criterion_path(), Operator::ContainsCaseInsensitive, value.into())
    }

    /// The text form matches the whole regular expression
    fn for_regexp(&self, pattern: &str) -> Result<Criterion<U>> {
        leaf(self.criterion_path(), Operator::Regexp, Operand::pattern(pattern)?)
    }

    /// The text form does not match the regular expression, null values included
    fn for_not_regexp(&self, pattern: &str) -> Result<Criterion<U>> {
        leaf(self.criterion_path(), Operator::NotRegexp, Operand::pattern(pattern)?)
    }

    /// Constant `true`
    fn for_all(&self) -> Criterion<U> {
        Criterion::constant(true)
    }

    /// Constant `false`
    fn for_none(&self) -> Criterion<U> {
        Criterion::constant(false)
    }

    /// Native SQL condition, `{0}` is replaced by the column name
    fn for_sql(&self, template: &str) -> Result<Criterion<U>> {
        let right = Operand::Sql {
            template: template.to_string(),
            value: None,
        };
        leaf(self.criterion_path(), Operator::XSql, right)
    }

    /// Native SQL condition with one bound value
    fn for_sql_value(&self, template: &str, value: V) -> Result<Criterion<U>> {
        let right = Operand::Sql {
            template: template.to_string(),
            value: Some(value.into_value()),
        };
        leaf(self.criterion_path(), Operator::XSql, right)
    }
}

impl<U, V: KeyValue> CriterionProvider<U, V> for Key<U, V> {
    fn criterion_path(&self) -> PropertyPath {
        self.path()
    }
}

impl<U, V: KeyValue> CriterionProvider<U, V> for KeyPath<U, V> {
    fn criterion_path(&self) -> PropertyPath {
        self.path().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::CriterionNode;
    use crate::test_domain::{Address, Customer, Person};

    #[test]
    fn test_empty_lists() {
        let id = &Person::keys().id;
        let person = Person::of(1, "A", 0.0);

        let none = id.for_in(Vec::new());
        let all = id.for_not_in(Vec::new());
        assert!(!none.evaluate(&person).unwrap());
        assert!(all.evaluate(&person).unwrap());
        assert_eq!(none.to_string(), "XFIXED false");
    }

    #[test]
    fn test_provided_leaves_pass_validation() {
        let keys = Person::keys();
        let criteria: Vec<Criterion<Person>> = vec![
            keys.id.for_eq(1),
            keys.id.for_in(vec![1, 2]),
            keys.id.for_not_in(vec![3]),
            keys.id.for_null(),
            keys.name.for_eq_key(&keys.name),
            keys.name.for_equals_ci("a"),
            keys.name.for_contains_ci("b"),
            keys.name.for_ends("c"),
        ];
        for criterion in criteria {
            match criterion.node() {
                CriterionNode::Value(leaf) => {
                    let checked = ValueCriterion::new(leaf.left().cloned(), leaf.operator(), leaf.right().clone());
                    assert!(checked.is_ok(), "{}", criterion);
                }
                other => panic!("Unexpected node {}", other),
            }
        }
    }

    #[test]
    fn test_null_checks() {
        let keys = Person::keys();
        let person = Person::new();

        assert!(keys.id.for_null().evaluate(&person).unwrap());
        assert!(!keys.id.for_not_null().evaluate(&person).unwrap());
        // The default value replaces null
        assert!(keys.name.for_not_null().evaluate(&person).unwrap());
    }

    #[test]
    fn test_key_to_key() {
        let keys = Person::keys();
        let mut person = Person::of(1, "A", 1.0);
        let criterion = keys.cash.for_eq_key(&keys.cash);
        assert!(criterion.evaluate(&person).unwrap());

        keys.cash.clear(&mut person).unwrap();
        assert!(criterion.evaluate(&person).unwrap());
    }

    #[test]
    fn test_path_criterion() {
        let city = Customer::keys().address.add(&Address::keys().city);
        let criterion = city.for_equals_ci("PRAGUE");

        let mut customer = Customer::new();
        assert!(!criterion.evaluate(&customer).unwrap());

        let mut address = Address::new();
        Address::keys().city.set_value(&mut address, "Prague".to_string()).unwrap();
        customer.set_address(address);
        assert!(criterion.evaluate(&customer).unwrap());
        assert_eq!(criterion.to_string(), "address.city EQUALS_CASE_INSENSITIVE \"PRAGUE\"");
    }

    #[test]
    fn test_regexp() {
        let name = &Person::keys().name;
        assert!(name.for_regexp("(").is_err());

        let criterion = name.for_not_regexp("[0-9]+").unwrap();
        assert!(criterion.evaluate(&Person::of(1, "Jan", 0.0)).unwrap());
    }

    #[test]
    fn test_all_and_none() {
        let person = Person::new();
        let id = &Person::keys().id;
        assert!(id.for_all().evaluate(&person).unwrap());
        assert!(!id.for_none().evaluate(&person).unwrap());
    }
}
