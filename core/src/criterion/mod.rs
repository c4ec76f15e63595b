//! Criterion expression engine
//!
//! A criterion is an immutable boolean expression tree built from value
//! leaves joined by AND, OR and NOT nodes. It is evaluated against one object
//! in memory or translated to an SQL condition by the ORM module.

mod operator;
mod provider;
mod value_criterion;

pub use operator::{BinaryOperator, Operator};
pub use provider::CriterionProvider;
pub use value_criterion::{Operand, ValueCriterion};

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::models::{Key, KeyValue};
use crate::ujo::Ujo;

/// Node of the criterion tree
#[derive(Debug, Clone)]
pub enum CriterionNode {
    /// Leaf comparing a key with an operand
    Value(ValueCriterion),

    /// Two criteria joined by AND or OR
    Binary {
        /// Left criterion, evaluated first
        left: Arc<CriterionNode>,
        /// Joining operator
        operator: BinaryOperator,
        /// Right criterion
        right: Arc<CriterionNode>,
    },

    /// Negation
    Not(Arc<CriterionNode>),
}

impl CriterionNode {
    /// Evaluate the node, AND and OR short-circuit from the left
    pub fn evaluate(&self, ujo: &dyn Ujo) -> Result<bool> {
        match self {
            CriterionNode::Value(leaf) => leaf.evaluate(ujo),
            CriterionNode::Binary {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(ujo)?;
                match operator {
                    BinaryOperator::And if !left => Ok(false),
                    BinaryOperator::Or if left => Ok(true),
                    _ => right.evaluate(ujo),
                }
            }
            CriterionNode::Not(inner) => Ok(!inner.evaluate(ujo)?),
        }
    }
}

impl Display for CriterionNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CriterionNode::Value(leaf) => write!(f, "{}", leaf),
            CriterionNode::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            CriterionNode::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}

/// Boolean expression over objects of the domain `U`
pub struct Criterion<U> {
    node: Arc<CriterionNode>,
    _marker: PhantomData<fn(&U)>,
}

impl<U> Clone for Criterion<U> {
    fn clone(&self) -> Self {
        Criterion::from_node(self.node.clone())
    }
}

impl<U> Debug for Criterion<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Criterion({})", self.node)
    }
}

impl<U> Display for Criterion<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.node, f)
    }
}

impl<U> From<ValueCriterion> for Criterion<U> {
    fn from(leaf: ValueCriterion) -> Self {
        Criterion::from_node(Arc::new(CriterionNode::Value(leaf)))
    }
}

impl<U> Criterion<U> {
    fn from_node(node: Arc<CriterionNode>) -> Self {
        Criterion {
            node,
            _marker: PhantomData,
        }
    }

    /// Constant criterion
    pub fn constant(value: bool) -> Self {
        ValueCriterion::fixed(value).into()
    }

    /// Checked criterion of a key, an operator and a value
    pub fn where_<V: KeyValue>(key: &Key<U, V>, operator: Operator, value: V) -> Result<Self> {
        let leaf = ValueCriterion::new(
            Some(key.path()),
            operator,
            Operand::Value(value.into_value()),
        )?;
        Ok(leaf.into())
    }

    /// Root node of the tree
    pub fn node(&self) -> &CriterionNode {
        &self.node
    }

    /// Is the root a binary node
    pub fn is_binary(&self) -> bool {
        matches!(*self.node, CriterionNode::Binary { .. })
    }

    /// Join with AND
    pub fn and(&self, other: &Criterion<U>) -> Criterion<U> {
        self.join(BinaryOperator::And, other)
    }

    /// Join with OR
    pub fn or(&self, other: &Criterion<U>) -> Criterion<U> {
        self.join(BinaryOperator::Or, other)
    }

    /// Join by a binary operator
    pub fn join(&self, operator: BinaryOperator, other: &Criterion<U>) -> Criterion<U> {
        Criterion::from_node(Arc::new(CriterionNode::Binary {
            left: self.node.clone(),
            operator,
            right: other.node.clone(),
        }))
    }

    /// Negation
    pub fn not(&self) -> Criterion<U> {
        Criterion::from_node(Arc::new(CriterionNode::Not(self.node.clone())))
    }
}

impl<U: Ujo> Criterion<U> {
    /// Evaluate the criterion against an object
    pub fn evaluate(&self, ujo: &U) -> Result<bool> {
        self.node.evaluate(ujo)
    }

    /// Objects satisfying the criterion in the original order
    pub fn filter<'a, I>(&self, items: I) -> Result<Vec<&'a U>>
    where
        I: IntoIterator<Item = &'a U>,
        U: 'a,
    {
        let mut result = Vec::new();
        for item in items {
            if self.evaluate(item)? {
                result.push(item);
            }
        }
        Ok(result)
    }

    /// Return an error with the message if the object does not satisfy the criterion
    pub fn validate(&self, ujo: &U, message: &str) -> Result<()> {
        if self.evaluate(ujo)? {
            Ok(())
        } else {
            Err(CoreError::InvalidArgument(format!("{}: {}", message, self)))
        }
    }
}
