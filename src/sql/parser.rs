//! SQL Recursive Descent Parser.
//!
//! Walks classified tokens and builds a [`Query`]: a SELECT with its column
//! list, FROM source and optional WHERE predicate, optionally chained to
//! further SELECTs with UNION / UNION ALL.

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::sql::lexer::{classify, Token, TokenKind};

/// Words that look like identifiers but are never table names or aliases.
const RESERVED_WORDS: [&str; 3] = ["AS", "UNION", "ALL"];

/// Select-list modifiers that are not supported; a word after them is never
/// a short-form alias.
const MODIFIER_WORDS: [&str; 2] = ["DISTINCT", "ALL"];

// ───────────────────────── Options ─────────────────────────

/// Parser limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum parenthesis nesting inside a column, and maximum number of
    /// SELECTs chained by UNION.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

// ───────────────────────── Parser struct ─────────────────────────

/// A recursive descent parser over a borrowed token slice.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    options: &'a ParseOptions,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], pos: usize, options: &'a ParseOptions) -> Self {
        Self {
            tokens,
            pos,
            options,
            depth: 0,
        }
    }

    // ─── Token navigation helpers ───

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self, expected: &str) -> Result<&'a Token> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token)
            }
            None => Err(Error::UnexpectedEndOfInput(expected.to_string())),
        }
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn match_word(&mut self, word: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_word(word)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> Result<()> {
        let position = self.pos;
        let token = self.advance(expected)?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(token, expected, position))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String> {
        let position = self.pos;
        let token = self.advance(expected)?;
        if is_name(token) {
            Ok(token.value.clone())
        } else {
            Err(unexpected(token, expected, position))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(Error::NestingTooDeep(self.options.max_depth));
        }
        Ok(())
    }

    // ─── Query ───

    fn parse_query(&mut self) -> Result<Query> {
        self.enter()?;
        let select = self.parse_select()?;
        let query = match self.parse_set_operation_kind()? {
            Some(kind) => {
                let right = self.parse_query()?;
                trace!(%kind, position = self.pos, "chained set operation");
                Query::SetOperation(SetOperation {
                    kind,
                    left: Box::new(Query::Select(select)),
                    right: Box::new(right),
                })
            }
            None => Query::Select(select),
        };
        self.depth -= 1;
        Ok(query)
    }

    /// Consume `UNION` or `UNION ALL` if present. The SELECT that must follow
    /// is left in place.
    fn parse_set_operation_kind(&mut self) -> Result<Option<SetOperationKind>> {
        let position = self.pos;
        if !self.match_word("UNION") {
            return Ok(None);
        }
        let kind = if self.match_word("ALL") {
            SetOperationKind::UnionAll
        } else {
            SetOperationKind::Union
        };
        match self.peek() {
            Some(token) if token.kind == TokenKind::SelectKeyword => Ok(Some(kind)),
            Some(token) => Err(Error::MalformedSetOperation(format!(
                "{} at position {} is followed by '{}' instead of SELECT",
                kind, position, token.value
            ))),
            None => Err(Error::MalformedSetOperation(format!(
                "{} at position {} is not followed by a SELECT",
                kind, position
            ))),
        }
    }

    // ─── SELECT ───

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_kind(TokenKind::SelectKeyword, "SELECT")?;
        let columns = self.parse_columns()?;
        let from = self.parse_from()?;
        let r#where = if self.match_kind(TokenKind::WhereKeyword) {
            Some(self.parse_where()?)
        } else {
            None
        };
        Ok(SelectStatement {
            columns,
            from,
            r#where,
        })
    }

    /// Scan the column list up to (not including) FROM.
    fn parse_columns(&mut self) -> Result<Vec<Column>> {
        let mut columns = Vec::new();
        let mut parts: Vec<&'a Token> = Vec::new();
        let mut alias: Option<String> = None;
        let mut depth = 0usize;

        loop {
            let Some(token) = self.peek() else {
                return Err(Error::MissingRequiredClause(
                    "SELECT reached end of input without FROM".to_string(),
                ));
            };
            match token.kind {
                TokenKind::FromKeyword => break,
                TokenKind::WhereKeyword | TokenKind::OrderByKeyword | TokenKind::LimitKeyword => {
                    return Err(Error::MissingRequiredClause(format!(
                        "'{}' at position {} appears before FROM",
                        token.value, self.pos
                    )));
                }
                TokenKind::CommaDelimiter if depth == 0 => {
                    columns.push(self.finish_column(&parts, alias.take())?);
                    parts.clear();
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            if let Some(alias) = &alias {
                return Err(Error::UnsupportedColumnShape(format!(
                    "'{}' follows the alias '{}'",
                    token.value, alias
                )));
            }
            if depth == 0 && token.is_word("AS") {
                self.pos += 1;
                alias = Some(self.expect_identifier("alias after AS")?);
                continue;
            }
            if depth == 0 && is_name(token) && ends_operand(parts.last().copied()) {
                self.pos += 1;
                alias = Some(token.value.clone());
                continue;
            }

            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            parts.push(token);
            self.pos += 1;
        }

        columns.push(self.finish_column(&parts, alias)?);
        Ok(columns)
    }

    fn finish_column(&self, parts: &[&'a Token], alias: Option<String>) -> Result<Column> {
        if parts.is_empty() {
            return Err(Error::UnsupportedColumnShape(format!(
                "empty column before position {}",
                self.pos
            )));
        }
        Ok(Column {
            expression: self.resolve_expression(parts, 0)?,
            alias,
        })
    }

    /// Resolve a column's tokens, splitting at top-level `||` first.
    fn resolve_expression(&self, parts: &[&Token], nesting: usize) -> Result<Expression> {
        if nesting > self.options.max_depth {
            return Err(Error::NestingTooDeep(self.options.max_depth));
        }
        let groups = split_concatenation(parts);
        if groups.len() == 1 {
            return self.resolve_group(groups[0], nesting);
        }
        let parts = groups
            .into_iter()
            .map(|group| self.resolve_group(group, nesting))
            .collect::<Result<Vec<_>>>()?;
        Ok(Expression::Concatenation { parts })
    }

    fn resolve_group(&self, group: &[&Token], nesting: usize) -> Result<Expression> {
        match group {
            [] => Err(Error::UnsupportedColumnShape(
                "'||' is missing an operand".to_string(),
            )),
            [token] => resolve_leaf(token),
            [first, ..] if first.kind == TokenKind::LeftParen => {
                let close = matching_paren(group)
                    .ok_or_else(|| Error::UnmatchedParenthesis(describe(group)))?;
                if close != group.len() - 1 {
                    return Err(Error::UnsupportedColumnShape(format!(
                        "unexpected tokens after ')' in '{}'",
                        describe(group)
                    )));
                }
                let inner = &group[1..close];
                if inner.is_empty() {
                    return Err(Error::UnsupportedColumnShape("empty parentheses".to_string()));
                }
                Ok(Expression::Parenthesized {
                    inner: Box::new(self.resolve_expression(inner, nesting + 1)?),
                })
            }
            _ if group.iter().any(|t| t.kind == TokenKind::RightParen) => {
                Err(Error::UnmatchedParenthesis(describe(group)))
            }
            _ => Err(Error::UnsupportedColumnShape(describe(group))),
        }
    }

    // ─── FROM ───

    fn parse_from(&mut self) -> Result<FromClause> {
        self.expect_kind(TokenKind::FromKeyword, "FROM")?;
        let source = self.expect_identifier("table name after FROM")?;
        let alias = if self.match_word("AS") {
            Some(self.expect_identifier("alias after AS")?)
        } else {
            match self.peek() {
                Some(token) if is_name(token) => {
                    self.pos += 1;
                    Some(token.value.clone())
                }
                _ => None,
            }
        };
        Ok(FromClause { source, alias })
    }

    // ─── WHERE ───

    /// Parse `cmp (AND|OR cmp)*` into a right-nested predicate tree.
    fn parse_where(&mut self) -> Result<WherePredicate> {
        let mut pending: Vec<(WherePredicate, LogicalOperator)> = Vec::new();
        let mut tail = self.parse_comparison()?;
        while let Some(operator) = self.peek().and_then(logical_operator) {
            self.pos += 1;
            let next = self.parse_comparison()?;
            pending.push((std::mem::replace(&mut tail, next), operator));
        }
        Ok(pending
            .into_iter()
            .rev()
            .fold(tail, |right, (left, operator)| WherePredicate::Logical {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            }))
    }

    fn parse_comparison(&mut self) -> Result<WherePredicate> {
        let left = self.parse_operand("operand in WHERE")?;
        let position = self.pos;
        let token = self.advance("comparison operator in WHERE")?;
        let operator = match token.refine() {
            TokenKind::Comparator(op) => op,
            _ => return Err(unexpected(token, "comparison operator in WHERE", position)),
        };
        let right = self.parse_operand(&format!("operand after '{}'", operator))?;
        Ok(WherePredicate::Comparison {
            operator,
            left,
            right,
        })
    }

    fn parse_operand(&mut self, expected: &str) -> Result<Expression> {
        let position = self.pos;
        let token = self.advance(expected)?;
        match token.refine() {
            TokenKind::Identifier if token.value.starts_with('\'') => {
                self.parse_split_literal(token)
            }
            TokenKind::Identifier => Ok(Expression::Identifier(token.value.clone())),
            TokenKind::StringLiteral => Ok(Expression::StringLiteral(token.value.clone())),
            TokenKind::FunctionCallRaw => decompose_function_call(&token.value),
            _ => Err(unexpected(token, expected, position)),
        }
    }

    /// A quoted literal the splitter broke at whitespace: join tokens until
    /// one ends with the closing quote.
    fn parse_split_literal(&mut self, head: &Token) -> Result<Expression> {
        let mut text = head.value[1..].to_string();
        let expected = format!("closing quote for {}", head.value);
        loop {
            let token = self.advance(&expected)?;
            text.push(' ');
            if token.kind == TokenKind::StringLiteral {
                text.push('\'');
                text.push_str(&token.value);
                text.push('\'');
                continue;
            }
            if let Some(last) = token.value.strip_suffix('\'') {
                text.push_str(last);
                return Ok(Expression::StringLiteral(text));
            }
            text.push_str(&token.value);
        }
    }
}

// ───────────────────────── Token predicates ─────────────────────────

/// An identifier usable as a table name or alias.
fn is_name(token: &Token) -> bool {
    token.refine() == TokenKind::Identifier
        && !token.value.starts_with('\'')
        && !token.value.ends_with('\'')
        && !RESERVED_WORDS.iter().any(|w| token.is_word(w))
}

/// Whether a bare name directly after `last` is a short-form alias.
fn ends_operand(last: Option<&Token>) -> bool {
    last.is_some_and(|token| match token.refine() {
        TokenKind::Identifier => !MODIFIER_WORDS.iter().any(|w| token.is_word(w)),
        kind => matches!(
            kind,
            TokenKind::StringLiteral
                | TokenKind::FunctionCallRaw
                | TokenKind::Asterisk
                | TokenKind::RightParen
        ),
    })
}

fn logical_operator(token: &Token) -> Option<LogicalOperator> {
    match token.refine() {
        TokenKind::LogicalOperator(op) => Some(op),
        _ => None,
    }
}

fn unexpected(token: &Token, expected: &str, position: usize) -> Error {
    Error::UnexpectedToken {
        expected: expected.to_string(),
        found: token.value.clone(),
        position,
    }
}

fn describe(tokens: &[&Token]) -> String {
    tokens
        .iter()
        .map(|t| t.value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// ───────────────────────── Expression helpers ─────────────────────────

/// Split at every `||` outside parentheses; `k` operators give `k + 1` groups.
fn split_concatenation<'s, 't>(parts: &'s [&'t Token]) -> Vec<&'s [&'t Token]> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in parts.iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => depth = depth.saturating_sub(1),
            TokenKind::ConcatOperator if depth == 0 => {
                groups.push(&parts[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    groups.push(&parts[start..]);
    groups
}

/// Index of the `)` balancing the `(` at index 0.
fn matching_paren(group: &[&Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in group.iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn resolve_leaf(token: &Token) -> Result<Expression> {
    match token.refine() {
        TokenKind::Asterisk => Ok(Expression::Asterisk),
        TokenKind::StringLiteral => Ok(Expression::StringLiteral(token.value.clone())),
        TokenKind::FunctionCallRaw => decompose_function_call(&token.value),
        TokenKind::Identifier
            if token.value.starts_with('\'') || token.value.ends_with('\'') =>
        {
            Err(Error::UnsupportedColumnShape(format!(
                "unbalanced quote in {}",
                token.value
            )))
        }
        TokenKind::Identifier => Ok(Expression::Identifier(token.value.clone())),
        TokenKind::LeftParen | TokenKind::RightParen => {
            Err(Error::UnmatchedParenthesis(token.value.clone()))
        }
        _ => Err(Error::UnsupportedColumnShape(token.value.clone())),
    }
}

/// Split raw `name(a, b)` text into its name and raw argument strings.
fn decompose_function_call(raw: &str) -> Result<Expression> {
    let open = raw
        .find('(')
        .ok_or_else(|| Error::UnsupportedColumnShape(raw.to_string()))?;
    let close = matching_close(raw, open)
        .ok_or_else(|| Error::UnmatchedParenthesis(raw.to_string()))?;
    if close != raw.len() - 1 {
        return Err(Error::UnsupportedColumnShape(format!(
            "unexpected text after the argument list in '{}'",
            raw
        )));
    }
    Ok(Expression::FunctionCall {
        name: raw[..open].to_string(),
        arguments: split_arguments(&raw[open + 1..close]),
    })
}

/// Byte index of the `)` balancing the `(` at `open`, skipping quoted text.
fn matching_close(raw: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quoted = false;
    for (i, ch) in raw[open..].char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an argument list at top-level commas outside quotes.
fn split_arguments(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                arguments.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    arguments.push(inner[start..].trim().to_string());
    arguments
}

// ───────────────────────── Public API ─────────────────────────

/// Build a query from classified tokens starting at `start`.
///
/// Returns the query and the position just past the last consumed token.
/// Anything after that position is left for the caller.
pub fn parse_tokens(tokens: &[Token], start: usize) -> Result<(Query, usize)> {
    parse_tokens_with(tokens, start, &ParseOptions::default())
}

/// [`parse_tokens`] with explicit limits.
pub fn parse_tokens_with(
    tokens: &[Token],
    start: usize,
    options: &ParseOptions,
) -> Result<(Query, usize)> {
    let mut parser = Parser::new(tokens, start, options);
    let query = parser.parse_query()?;
    Ok((query, parser.pos))
}

/// Classify pre-split lexemes and parse them as one complete query.
pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Query> {
    parse_with(raw, &ParseOptions::default())
}

/// [`parse`] with explicit limits.
pub fn parse_with<S: AsRef<str>>(raw: &[S], options: &ParseOptions) -> Result<Query> {
    let tokens: Vec<Token> = classify(raw)
        .into_iter()
        .filter(|t| t.kind != TokenKind::EmptySpace)
        .collect();

    let result = parse_tokens_with(&tokens, 0, options).and_then(|(query, end)| {
        match tokens.get(end) {
            Some(token) => Err(Error::TrailingTokens {
                token: token.value.clone(),
                position: end,
            }),
            None => Ok(query),
        }
    });
    match &result {
        Ok(query) => debug!(
            tokens = tokens.len(),
            statements = query.selects().len(),
            "parsed query"
        ),
        Err(e) => debug!(tokens = tokens.len(), error = %e, "failed to parse query"),
    }
    result
}

// ───────────────────────── Tests ─────────────────────────
