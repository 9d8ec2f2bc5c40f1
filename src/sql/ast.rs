//! SQL Abstract Syntax Tree (AST) type definitions.
//!
//! These types are produced by the parser and handed to whatever interprets,
//! plans or compiles the query. Their serde representation (field names and
//! snake_case variant tags) is the stable schema downstream consumers rely on.

use std::fmt;

use serde::{Deserialize, Serialize};

// ───────────────────────── Query root ─────────────────────────

/// The root of a parsed query: a single SELECT or a chain of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// SELECT ... FROM ... [WHERE ...]
    Select(SelectStatement),
    /// SELECT ... UNION [ALL] SELECT ...
    SetOperation(SetOperation),
}

impl Query {
    /// All SELECT statements of this query in source order.
    pub fn selects(&self) -> Vec<&SelectStatement> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(query) = stack.pop() {
            match query {
                Query::Select(select) => out.push(select),
                Query::SetOperation(op) => {
                    // Right first so the left side pops first.
                    stack.push(&op.right);
                    stack.push(&op.left);
                }
            }
        }
        out
    }
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectStatement {
    /// The projected columns, never empty.
    pub columns: Vec<Column>,
    /// The single FROM source.
    pub from: FromClause,
    /// Optional WHERE filter.
    pub r#where: Option<WherePredicate>,
}

/// Two queries combined by UNION or UNION ALL.
///
/// Chains nest to the right: `a UNION b UNION c` is `Union(a, Union(b, c))`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOperation {
    pub kind: SetOperationKind,
    pub left: Box<Query>,
    pub right: Box<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOperationKind {
    Union,
    UnionAll,
}

impl fmt::Display for SetOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetOperationKind::Union => write!(f, "UNION"),
            SetOperationKind::UnionAll => write!(f, "UNION ALL"),
        }
    }
}

// ───────────────────────── Columns and sources ─────────────────────────

/// A single item in the SELECT column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub expression: Expression,
    /// Set by `expr AS alias` or the short form `expr alias`.
    pub alias: Option<String>,
}

/// The FROM clause of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromClause {
    /// Table name.
    pub source: String,
    /// Optional alias.
    pub alias: Option<String>,
}

// ───────────────────────── Expressions ─────────────────────────

/// An expression appearing in the column list or as a WHERE operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// A bare name (column, number or other unquoted word).
    Identifier(String),
    /// A single-quoted string literal (contents without quotes).
    StringLiteral(String),
    /// `*`
    Asterisk,
    /// `name(arg, ...)`. Arguments stay raw text; they are not parsed further.
    FunctionCall {
        name: String,
        arguments: Vec<String>,
    },
    /// `a || b || ...`, always at least two parts.
    Concatenation { parts: Vec<Expression> },
    /// `( expr )`
    Parenthesized { inner: Box<Expression> },
}

// ───────────────────────── WHERE ─────────────────────────

/// A WHERE predicate tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WherePredicate {
    /// `left <op> right`
    Comparison {
        operator: ComparisonOperator,
        left: Expression,
        right: Expression,
    },
    /// `left AND|OR right`
    Logical {
        operator: LogicalOperator,
        left: Box<WherePredicate>,
        right: Box<WherePredicate>,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Like,
}

impl ComparisonOperator {
    /// Match an operator lexeme, case-insensitively for `LIKE`.
    pub fn from_symbol(s: &str) -> Option<ComparisonOperator> {
        match s.to_ascii_uppercase().as_str() {
            "=" | "==" => Some(ComparisonOperator::Equal),
            "!=" | "<>" => Some(ComparisonOperator::NotEqual),
            "<" => Some(ComparisonOperator::LessThan),
            "<=" => Some(ComparisonOperator::LessEqual),
            ">" => Some(ComparisonOperator::GreaterThan),
            ">=" => Some(ComparisonOperator::GreaterEqual),
            "LIKE" => Some(ComparisonOperator::Like),
            _ => None,
        }
    }

    /// Canonical lexeme.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessEqual => "<=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterEqual => ">=",
            ComparisonOperator::Like => "LIKE",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn from_word(s: &str) -> Option<LogicalOperator> {
        if s.eq_ignore_ascii_case("AND") {
            Some(LogicalOperator::And)
        } else if s.eq_ignore_ascii_case("OR") {
            Some(LogicalOperator::Or)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────── Tests ─────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn select_from(table: &str) -> SelectStatement {
        SelectStatement {
            columns: vec![Column {
                expression: Expression::Asterisk,
                alias: None,
            }],
            from: FromClause {
                source: table.to_string(),
                alias: None,
            },
            r#where: None,
        }
    }

    #[test]
    fn test_selects_in_source_order() {
        let query = Query::SetOperation(SetOperation {
            kind: SetOperationKind::Union,
            left: Box::new(Query::Select(select_from("a"))),
            right: Box::new(Query::SetOperation(SetOperation {
                kind: SetOperationKind::UnionAll,
                left: Box::new(Query::Select(select_from("b"))),
                right: Box::new(Query::Select(select_from("c"))),
            })),
        });
        let sources: Vec<&str> = query
            .selects()
            .iter()
            .map(|s| s.from.source.as_str())
            .collect();
        assert_eq!(sources, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_selects_single_statement() {
        let query = Query::Select(select_from("t"));
        assert_eq!(query.selects().len(), 1);
    }

    #[test]
    fn test_comparison_operator_symbols() {
        assert_eq!(ComparisonOperator::from_symbol("<>"), Some(ComparisonOperator::NotEqual));
        assert_eq!(ComparisonOperator::from_symbol("like"), Some(ComparisonOperator::Like));
        assert_eq!(ComparisonOperator::from_symbol(">="), Some(ComparisonOperator::GreaterEqual));
        assert_eq!(ComparisonOperator::from_symbol("=>"), None);
        assert_eq!(ComparisonOperator::NotEqual.to_string(), "!=");
    }

    #[test]
    fn test_logical_operator_words() {
        assert_eq!(LogicalOperator::from_word("and"), Some(LogicalOperator::And));
        assert_eq!(LogicalOperator::from_word("Or"), Some(LogicalOperator::Or));
        assert_eq!(LogicalOperator::from_word("ANDY"), None);
    }

    #[test]
    fn test_set_operation_kind_display() {
        assert_eq!(SetOperationKind::Union.to_string(), "UNION");
        assert_eq!(SetOperationKind::UnionAll.to_string(), "UNION ALL");
    }

    #[test]
    fn test_serialized_schema() {
        let mut select = select_from("users");
        select.from.alias = Some("u".to_string());
        select.columns.push(Column {
            expression: Expression::FunctionCall {
                name: "count".to_string(),
                arguments: vec!["id".to_string()],
            },
            alias: Some("n".to_string()),
        });
        select.r#where = Some(WherePredicate::Comparison {
            operator: ComparisonOperator::Equal,
            left: Expression::Identifier("x".to_string()),
            right: Expression::StringLiteral("y".to_string()),
        });
        let value = serde_json::to_value(Query::Select(select)).unwrap();
        assert_eq!(
            value,
            json!({
                "select": {
                    "columns": [
                        { "expression": "asterisk", "alias": null },
                        {
                            "expression": {
                                "function_call": { "name": "count", "arguments": ["id"] }
                            },
                            "alias": "n"
                        }
                    ],
                    "from": { "source": "users", "alias": "u" },
                    "where": {
                        "comparison": {
                            "operator": "equal",
                            "left": { "identifier": "x" },
                            "right": { "string_literal": "y" }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_schema_deserializes_back() {
        let query = Query::SetOperation(SetOperation {
            kind: SetOperationKind::UnionAll,
            left: Box::new(Query::Select(select_from("a"))),
            right: Box::new(Query::Select(select_from("b"))),
        });
        let text = serde_json::to_string(&query).unwrap();
        assert!(text.contains("\"union_all\""));
        let back: Query = serde_json::from_str(&text).unwrap();
        assert_eq!(back, query);
    }
}
