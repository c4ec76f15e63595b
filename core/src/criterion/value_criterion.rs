//! Leaf criterion comparing a property path with an operand

use std::fmt::{Display, Formatter, Result as FmtResult};

use regex::Regex;

use crate::error::{CoreError, Result};
use crate::models::{PropertyPath, Value, ValueType};
use crate::ujo::Ujo;
use super::operator::Operator;

/// Right side of a value criterion
#[derive(Debug, Clone)]
pub enum Operand {
    /// Constant value, `Value::Null` included
    Value(Value),

    /// Non-null items of the `IN` operators
    List(Vec<Value>),

    /// Another property path of the same object
    Path(PropertyPath),

    /// Regular expression anchored to the whole text
    Pattern(Regex),

    /// Result of the `XFIXED` operator
    Fixed(bool),

    /// Native SQL template, `{0}` stands for the column of the left path
    Sql {
        /// Template text
        template: String,
        /// Optional bound value
        value: Option<Value>,
    },
}

impl Operand {
    /// Anchored regular expression operand
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Operand::Pattern(Regex::new(&format!("^(?:{})$", pattern))?))
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Operand::Value(value) => write!(f, "{}", value),
            Operand::List(items) => write!(f, "{}", Value::List(items.clone())),
            Operand::Path(path) => write!(f, "{}", path),
            Operand::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
            Operand::Fixed(value) => write!(f, "{}", value),
            Operand::Sql { template, .. } => write!(f, "'{}'", template),
        }
    }
}

/// Leaf of the criterion tree
#[derive(Debug, Clone)]
pub struct ValueCriterion {
    left: Option<PropertyPath>,
    operator: Operator,
    right: Operand,
}

impl ValueCriterion {
    /// Create a checked leaf
    pub fn new(left: Option<PropertyPath>, operator: Operator, right: Operand) -> Result<Self> {
        Self::check(left.as_ref(), operator, &right)?;
        Ok(ValueCriterion {
            left,
            operator,
            right,
        })
    }

    /// Leaf whose operand type is guaranteed by the caller's type bounds
    pub(crate) fn trusted(left: PropertyPath, operator: Operator, right: Operand) -> Self {
        debug_assert!(Self::check(Some(&left), operator, &right).is_ok());
        ValueCriterion {
            left: Some(left),
            operator,
            right,
        }
    }

    /// Constant leaf
    pub fn fixed(value: bool) -> Self {
        ValueCriterion {
            left: None,
            operator: Operator::XFixed,
            right: Operand::Fixed(value),
        }
    }

    fn check(left: Option<&PropertyPath>, operator: Operator, right: &Operand) -> Result<()> {
        let invalid = |message: &str| {
            Err(CoreError::InvalidArgument(format!(
                "{} for the operator {}",
                message, operator
            )))
        };

        if operator == Operator::XFixed {
            return match right {
                Operand::Fixed(_) => Ok(()),
                _ => invalid("A boolean constant is required"),
            };
        }
        let left = match left {
            Some(left) => left,
            None => return invalid("A key is required"),
        };

        match operator {
            Operator::XSql => match right {
                Operand::Sql { template, .. } if !template.trim().is_empty() => Ok(()),
                _ => invalid("A non-blank SQL template is required"),
            },
            Operator::In | Operator::NotIn => match right {
                Operand::List(items) if items.iter().any(Value::is_null) => {
                    invalid("A null list item is not supported")
                }
                Operand::List(_) => Ok(()),
                _ => invalid("A list of values is required"),
            },
            Operator::Regexp | Operator::NotRegexp => match right {
                Operand::Pattern(_) => Ok(()),
                _ => invalid("A regular expression is required"),
            },
            op if op.is_text() => {
                let key_type = left.last().value_type();
                if key_type != ValueType::Text && key_type != ValueType::Json {
                    return invalid(format!("The text key is required, not {}", key_type).as_str());
                }
                match right {
                    Operand::Value(Value::Text(_)) | Operand::Value(Value::Null) => Ok(()),
                    _ => invalid("A text value is required"),
                }
            }
            _ => match right {
                Operand::Value(_) | Operand::Path(_) => Ok(()),
                _ => invalid("A value or a key is required"),
            },
        }
    }

    /// Left property path, `None` for the constant leaf
    pub fn left(&self) -> Option<&PropertyPath> {
        self.left.as_ref()
    }

    /// Operator of the leaf
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Right operand
    pub fn right(&self) -> &Operand {
        &self.right
    }

    /// Evaluate the leaf against an object
    pub fn evaluate(&self, ujo: &dyn Ujo) -> Result<bool> {
        let left = match &self.left {
            Some(path) => path.read(ujo),
            None => Value::Null,
        };

        let right = match &self.right {
            Operand::Fixed(value) => return Ok(*value),
            Operand::Sql { template, .. } => {
                return Err(CoreError::Unsupported(format!(
                    "The native condition '{}' cannot be evaluated in memory",
                    template
                )))
            }
            Operand::List(items) => {
                let found = !left.is_null() && items.iter().any(|item| left.loose_eq(item));
                return Ok(match self.operator {
                    Operator::NotIn => !found,
                    _ => found,
                });
            }
            Operand::Pattern(regex) => {
                let found = left.as_text().map_or(false, |text| regex.is_match(&text));
                return Ok(match self.operator {
                    Operator::NotRegexp => !found,
                    _ => found,
                });
            }
            Operand::Value(value) => value.clone(),
            Operand::Path(path) => path.read(ujo),
        };

        let result = match self.operator {
            Operator::Eq => left.loose_eq(&right),
            Operator::NotEq => !left.loose_eq(&right),
            Operator::Gt => left.compare(&right).map_or(false, |o| o.is_gt()),
            Operator::Ge => left.compare(&right).map_or(false, |o| o.is_ge()),
            Operator::Lt => left.compare(&right).map_or(false, |o| o.is_lt()),
            Operator::Le => left.compare(&right).map_or(false, |o| o.is_le()),
            op => Self::compare_text(op, &left, &right),
        };
        Ok(result)
    }

    fn compare_text(operator: Operator, left: &Value, right: &Value) -> bool {
        let (left, right) = match (left.as_text(), right.as_text()) {
            (None, None) => return true,
            (Some(left), Some(right)) => (left, right),
            _ => return false,
        };
        let (left, right) = if operator.is_case_insensitive() {
            (left.to_lowercase(), right.to_lowercase())
        } else {
            (left.into_owned(), right.into_owned())
        };

        match operator {
            Operator::EqualsCaseInsensitive => left == right,
            Operator::Starts | Operator::StartsCaseInsensitive => left.starts_with(&right),
            Operator::Ends | Operator::EndsCaseInsensitive => left.ends_with(&right),
            Operator::Contains | Operator::ContainsCaseInsensitive => left.contains(&right),
            _ => false,
        }
    }
}

impl Display for ValueCriterion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.left {
            Some(left) => write!(f, "{} {} {}", left, self.operator, self.right),
            None => write!(f, "{} {}", self.operator, self.right),
        }
    }
}
