//! Canonical AST-to-token serializer.
//!
//! Emits one lexeme per element in the same shape the parser consumes, so a
//! tree produced by [`parse`](crate::sql::parse) re-parses to itself.

use crate::sql::ast::*;

/// Serialize a query into its canonical lexeme sequence.
pub fn to_tokens(query: &Query) -> Vec<String> {
    let mut out = Vec::new();
    write_query(query, &mut out);
    out
}

fn write_query(query: &Query, out: &mut Vec<String>) {
    match query {
        Query::Select(select) => write_select(select, out),
        Query::SetOperation(op) => {
            write_query(&op.left, out);
            out.push("UNION".to_string());
            if op.kind == SetOperationKind::UnionAll {
                out.push("ALL".to_string());
            }
            write_query(&op.right, out);
        }
    }
}

fn write_select(select: &SelectStatement, out: &mut Vec<String>) {
    out.push("SELECT".to_string());
    for (i, column) in select.columns.iter().enumerate() {
        if i > 0 {
            out.push(",".to_string());
        }
        write_expression(&column.expression, out);
        write_alias(column.alias.as_deref(), out);
    }
    out.push("FROM".to_string());
    out.push(select.from.source.clone());
    write_alias(select.from.alias.as_deref(), out);
    if let Some(predicate) = &select.r#where {
        out.push("WHERE".to_string());
        write_predicate(predicate, out);
    }
}

fn write_alias(alias: Option<&str>, out: &mut Vec<String>) {
    if let Some(alias) = alias {
        out.push("AS".to_string());
        out.push(alias.to_string());
    }
}

fn write_expression(expression: &Expression, out: &mut Vec<String>) {
    match expression {
        Expression::Identifier(name) => out.push(name.clone()),
        Expression::StringLiteral(value) => out.push(format!("'{}'", value)),
        Expression::Asterisk => out.push("*".to_string()),
        Expression::FunctionCall { name, arguments } => {
            out.push(format!("{}({})", name, arguments.join(",")))
        }
        Expression::Concatenation { parts } => {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push("||".to_string());
                }
                write_expression(part, out);
            }
        }
        Expression::Parenthesized { inner } => {
            out.push("(".to_string());
            write_expression(inner, out);
            out.push(")".to_string());
        }
    }
}

fn write_predicate(predicate: &WherePredicate, out: &mut Vec<String>) {
    match predicate {
        WherePredicate::Comparison {
            operator,
            left,
            right,
        } => {
            write_expression(left, out);
            out.push(operator.as_str().to_string());
            write_expression(right, out);
        }
        WherePredicate::Logical {
            operator,
            left,
            right,
        } => {
            write_predicate(left, out);
            out.push(operator.as_str().to_string());
            write_predicate(right, out);
        }
    }
}
