//! Translation of a criterion to an SQL condition
//!
//! Every leaf is printed so that the condition is `TRUE` exactly for the
//! rows where the in-memory evaluation gives `true`. Negated operators add
//! `OR column IS NULL` and the `NOT` node is printed as `(..) IS NOT TRUE`,
//! so a `NULL` of the three-valued SQL logic never differs from the memory
//! result.

use std::sync::Arc;

use ujorm_core::criterion::{BinaryOperator, CriterionNode, Operand, ValueCriterion};
use ujorm_core::models::PropertyPath;
use ujorm_core::{Operator, SortKey, Value};

use crate::dialect::{SqlDialect, COLUMN_PLACEHOLDER, VALUE_PLACEHOLDER};
use crate::error::{OrmError, Result};
use crate::meta::{MetaModel, MetaTable};

/// Table joined by a property path through a relation
#[derive(Debug, Clone)]
pub struct Join {
    /// Joined table
    pub table: Arc<MetaTable>,

    /// Condition `child.fk = parent.pk`
    pub predicate: String,
}

/// SQL condition of a criterion
#[derive(Debug, Clone)]
pub struct DecodedCriterion {
    /// Condition including the join predicates
    pub where_sql: String,

    /// Bind values in the order of the placeholders
    pub params: Vec<Value>,

    /// Tables of the `FROM` clause, the root table first
    pub tables: Vec<String>,
}

impl DecodedCriterion {
    /// Does the condition read more tables
    pub fn has_joins(&self) -> bool {
        self.tables.len() > 1
    }
}

/// Decoder of the criteria of one root table
#[derive(Debug)]
pub struct CriterionDecoder<'a> {
    model: &'a MetaModel,
    dialect: &'a dyn SqlDialect,
    root: Arc<MetaTable>,
    joins: Vec<Join>,
    params: Vec<Value>,
}

impl<'a> CriterionDecoder<'a> {
    /// Decoder of the root table
    pub fn new(model: &'a MetaModel, dialect: &'a dyn SqlDialect, root: Arc<MetaTable>) -> Self {
        CriterionDecoder {
            model,
            dialect,
            root,
            joins: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Print the condition of the node, the bind values are collected
    pub fn decode(&mut self, node: &CriterionNode) -> Result<String> {
        let mut out = String::new();
        self.write_node(node, &mut out)?;
        Ok(out)
    }

    /// Print the `ORDER BY` items, nulls are sorted last
    pub fn order_by(&mut self, keys: &[SortKey]) -> Result<String> {
        let mut items = Vec::new();
        for key in keys {
            let direction = if key.is_descending() { "DESC" } else { "ASC" };
            for column in self.columns(key.path())? {
                items.push(format!("{} {} NULLS LAST", column, direction));
            }
        }
        Ok(items.join(", "))
    }

    /// Tables of the `FROM` clause, the root table first
    pub fn from_tables(&self) -> Vec<String> {
        std::iter::once(self.dialect.table_name(&self.root))
            .chain(self.joins.iter().map(|join| self.dialect.table_name(&join.table)))
            .collect()
    }

    /// Join predicates appended to a condition
    pub fn join_predicates(&self) -> String {
        self.joins
            .iter()
            .map(|join| format!(" AND {}", join.predicate))
            .collect()
    }

    /// Joined tables
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Collected bind values
    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Decode the criterion node to a complete condition
    pub fn decode_criterion(mut self, node: &CriterionNode) -> Result<DecodedCriterion> {
        let mut where_sql = self.decode(node)?;
        where_sql.push_str(&self.join_predicates());
        Ok(DecodedCriterion {
            tables: self.from_tables(),
            where_sql,
            params: self.params,
        })
    }

    fn write_node(&mut self, node: &CriterionNode, out: &mut String) -> Result<()> {
        match node {
            CriterionNode::Value(leaf) => self.write_leaf(leaf, out),
            CriterionNode::Binary {
                left,
                operator,
                right,
            } => {
                out.push('(');
                self.write_node(left, out)?;
                out.push_str(match operator {
                    BinaryOperator::And => " AND ",
                    BinaryOperator::Or => " OR ",
                });
                self.write_node(right, out)?;
                out.push(')');
                Ok(())
            }
            CriterionNode::Not(inner) => {
                out.push_str("((");
                self.write_node(inner, out)?;
                out.push_str(") IS NOT TRUE)");
                Ok(())
            }
        }
    }

    /// Qualified physical columns of the path, relations add joins
    fn columns(&mut self, path: &PropertyPath) -> Result<Vec<String>> {
        let mut table = self.root.clone();
        for key in path.relations() {
            let column = table.column_required(key)?;
            let foreign = column.foreign.as_ref().ok_or_else(|| {
                OrmError::Mapping(format!("Key {} of the path {} is not a relation", key, path))
            })?;
            let target = self.model.table_by_name(&foreign.table).cloned().ok_or_else(|| {
                OrmError::Mapping(format!("Table {} is not mapped", foreign.table))
            })?;
            let pairs: Vec<String> = column
                .column_names()
                .zip(&foreign.columns)
                .map(|(fk, pk)| format!("{}.{} = {}.{}", table.name, fk, target.name, pk))
                .collect();
            let predicate = format!("({})", pairs.join(" AND "));
            self.add_join(&target, predicate, path)?;
            table = target;
        }

        let column = table.column_required(path.last())?;
        Ok(column
            .column_names()
            .map(|name| format!("{}.{}", table.name, name))
            .collect())
    }

    fn add_join(&mut self, target: &Arc<MetaTable>, predicate: String, path: &PropertyPath) -> Result<()> {
        if target.name == self.root.name {
            return Err(OrmError::Unsupported(format!("Self join of the path {}", path)));
        }
        match self.joins.iter().find(|join| join.table.name == target.name) {
            Some(join) if join.predicate == predicate => Ok(()),
            Some(_) => Err(OrmError::Unsupported(format!(
                "Table {} is joined twice by the path {}",
                target.name, path
            ))),
            None => {
                self.joins.push(Join {
                    table: target.clone(),
                    predicate,
                });
                Ok(())
            }
        }
    }

    fn single(columns: Vec<String>, operator: Operator) -> Result<String> {
        match <[String; 1]>::try_from(columns) {
            Ok([column]) => Ok(column),
            Err(_) => Err(OrmError::Unsupported(format!(
                "Operator {} on a composite relation",
                operator
            ))),
        }
    }

    fn write_leaf(&mut self, leaf: &ValueCriterion, out: &mut String) -> Result<()> {
        let operator = leaf.operator();
        let path = match (leaf.left(), leaf.right()) {
            (_, Operand::Fixed(value)) => {
                out.push_str(if *value { "1=1" } else { "1=0" });
                return Ok(());
            }
            (Some(path), _) => path,
            (None, _) => {
                return Err(OrmError::Unsupported(format!("Leaf {} has no key", leaf)));
            }
        };
        let columns = self.columns(path)?;

        match leaf.right() {
            Operand::Fixed(_) => Ok(()),
            Operand::Sql { template, value } => {
                let column = Self::single(columns, operator)?;
                out.push_str(&template.replace(COLUMN_PLACEHOLDER, &column));
                if let Some(value) = value {
                    self.params.push(value.clone());
                }
                Ok(())
            }
            Operand::Path(other) => {
                let left = Self::single(columns, operator)?;
                let right = Self::single(self.columns(other)?, operator)?;
                self.write_columns(operator, &left, &right, out)
            }
            Operand::List(items) => {
                let column = Self::single(columns, operator)?;
                let marks = vec!["?"; items.len()].join(", ");
                let sql = self.fill(operator, &column, &marks)?;
                self.params.extend(items.iter().cloned());
                Self::write_negated(operator, &sql, &column, out);
                Ok(())
            }
            Operand::Pattern(regex) => {
                let column = Self::single(columns, operator)?;
                let sql = self.fill(operator, &column, "?")?;
                self.params.push(Value::Text(regex.as_str().to_string()));
                Self::write_negated(operator, &sql, &column, out);
                Ok(())
            }
            Operand::Value(Value::Null) => Self::write_null(operator, &columns, out),
            Operand::Value(value) if columns.len() > 1 => {
                self.write_composite(operator, &columns, value, out)
            }
            Operand::Value(value) => {
                let column = Self::single(columns, operator)?;
                self.write_value(operator, column, value, out)
            }
        }
    }

    fn fill(&self, operator: Operator, column: &str, values: &str) -> Result<String> {
        Ok(self
            .dialect
            .criterion_template(operator)?
            .replace(COLUMN_PLACEHOLDER, column)
            .replace(VALUE_PLACEHOLDER, values))
    }

    fn write_negated(operator: Operator, sql: &str, column: &str, out: &mut String) {
        if operator.is_negation() {
            out.push_str(&format!("({} OR {} IS NULL)", sql, column));
        } else {
            out.push_str(sql);
        }
    }

    fn write_value(&mut self, operator: Operator, column: String, value: &Value, out: &mut String) -> Result<()> {
        if !operator.is_text() {
            let sql = self.fill(operator, &column, "?")?;
            self.params.push(value.clone());
            Self::write_negated(operator, &sql, &column, out);
            return Ok(());
        }

        let text = value.as_text().ok_or_else(|| {
            OrmError::Unsupported(format!("Operator {} requires a text value", operator))
        })?;
        let (column, text) = if operator.is_case_insensitive() {
            (format!("LOWER({})", column), text.to_lowercase())
        } else {
            (column, text.into_owned())
        };
        let bound = match operator {
            Operator::Starts | Operator::StartsCaseInsensitive => format!("{}%", escape_like(&text)),
            Operator::Ends | Operator::EndsCaseInsensitive => format!("%{}", escape_like(&text)),
            Operator::Contains | Operator::ContainsCaseInsensitive => {
                format!("%{}%", escape_like(&text))
            }
            _ => text,
        };
        out.push_str(&self.fill(operator, &column, "?")?);
        self.params.push(Value::Text(bound));
        Ok(())
    }

    fn write_null(operator: Operator, columns: &[String], out: &mut String) -> Result<()> {
        let (test, joiner) = match operator {
            Operator::NotEq => ("IS NOT NULL", " OR "),
            Operator::Eq => ("IS NULL", " AND "),
            op if op.is_text() => ("IS NULL", " AND "),
            op => {
                return Err(OrmError::Unsupported(format!(
                    "Operator {} with a null value",
                    op
                )))
            }
        };
        let items: Vec<String> = columns.iter().map(|c| format!("{} {}", c, test)).collect();
        if items.len() == 1 {
            out.push_str(&items[0]);
        } else {
            out.push_str(&format!("({})", items.join(joiner)));
        }
        Ok(())
    }

    fn write_composite(&mut self, operator: Operator, columns: &[String], value: &Value, out: &mut String) -> Result<()> {
        let items = match value {
            Value::List(items) if items.len() == columns.len() => items,
            _ => {
                return Err(OrmError::Mapping(format!(
                    "Composite key {} requires {} values",
                    columns.join(", "),
                    columns.len()
                )))
            }
        };
        let pairs: Vec<String> = columns.iter().map(|c| format!("{} = ?", c)).collect();
        let sql = format!("({})", pairs.join(" AND "));
        match operator {
            Operator::Eq => out.push_str(&sql),
            Operator::NotEq => out.push_str(&format!("({} IS NOT TRUE)", sql)),
            op => {
                return Err(OrmError::Unsupported(format!(
                    "Operator {} on a composite relation",
                    op
                )))
            }
        }
        self.params.extend(items.iter().cloned());
        Ok(())
    }

    fn write_columns(&self, operator: Operator, left: &str, right: &str, out: &mut String) -> Result<()> {
        match operator {
            Operator::Eq => out.push_str(&format!(
                "({l} = {r} OR ({l} IS NULL AND {r} IS NULL))",
                l = left,
                r = right
            )),
            Operator::NotEq => out.push_str(&format!(
                "({l} <> {r} OR ({l} IS NULL AND {r} IS NOT NULL) OR ({l} IS NOT NULL AND {r} IS NULL))",
                l = left,
                r = right
            )),
            op => out.push_str(&self.fill(op, left, right)?),
        }
        Ok(())
    }
}

/// Escape the meta characters of a `LIKE` pattern by the backslash
pub fn escape_like(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}
