//! Criterion operators

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Operator of a value criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equal, a null value equals null
    Eq,
    /// Not equal
    NotEq,
    /// Greater than
    Gt,
    /// Greater or equal
    Ge,
    /// Less than
    Lt,
    /// Less or equal
    Le,
    /// The text form matches the whole regular expression
    Regexp,
    /// The text form does not match the regular expression
    NotRegexp,
    /// Case insensitive text equality
    EqualsCaseInsensitive,
    /// Text prefix
    Starts,
    /// Case insensitive text prefix
    StartsCaseInsensitive,
    /// Text suffix
    Ends,
    /// Case insensitive text suffix
    EndsCaseInsensitive,
    /// Text contains the value
    Contains,
    /// Case insensitive text contains the value
    ContainsCaseInsensitive,
    /// The value is one of the list items
    In,
    /// The value is none of the list items
    NotIn,
    /// Constant result
    XFixed,
    /// Native SQL condition, no in-memory evaluation
    XSql,
}

impl Operator {
    /// Text operators require a text key and a text operand
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Operator::EqualsCaseInsensitive
                | Operator::Starts
                | Operator::StartsCaseInsensitive
                | Operator::Ends
                | Operator::EndsCaseInsensitive
                | Operator::Contains
                | Operator::ContainsCaseInsensitive
        )
    }

    /// Case insensitive text operators
    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            Operator::EqualsCaseInsensitive
                | Operator::StartsCaseInsensitive
                | Operator::EndsCaseInsensitive
                | Operator::ContainsCaseInsensitive
        )
    }

    /// Ordering operators
    pub fn is_comparison(&self) -> bool {
        matches!(self, Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le)
    }

    /// Negative operators, a null left side satisfies them
    pub fn is_negation(&self) -> bool {
        matches!(self, Operator::NotEq | Operator::NotIn | Operator::NotRegexp)
    }

    /// Upper case name used by the text form of criteria
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::NotEq => "NOT_EQ",
            Operator::Gt => "GT",
            Operator::Ge => "GE",
            Operator::Lt => "LT",
            Operator::Le => "LE",
            Operator::Regexp => "REGEXP",
            Operator::NotRegexp => "NOT_REGEXP",
            Operator::EqualsCaseInsensitive => "EQUALS_CASE_INSENSITIVE",
            Operator::Starts => "STARTS",
            Operator::StartsCaseInsensitive => "STARTS_CASE_INSENSITIVE",
            Operator::Ends => "ENDS",
            Operator::EndsCaseInsensitive => "ENDS_CASE_INSENSITIVE",
            Operator::Contains => "CONTAINS",
            Operator::ContainsCaseInsensitive => "CONTAINS_CASE_INSENSITIVE",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::XFixed => "XFIXED",
            Operator::XSql => "XSQL",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Operator joining two criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// Conjunction
    And,
    /// Disjunction
    Or,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BinaryOperator::And => f.write_str("AND"),
            BinaryOperator::Or => f.write_str("OR"),
        }
    }
}
