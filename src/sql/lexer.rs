//! SQL token classifier.
//!
//! The upstream splitter hands us one string per lexeme. Classification maps
//! each of them, one to one, onto a [`Token`]. It never fails: anything it
//! does not recognise becomes [`TokenKind::Unknown`] and is judged by the
//! parser, which refines it with [`Token::refine`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::sql::ast::{ComparisonOperator, LogicalOperator};

// ───────────────────────── Token types ─────────────────────────

/// A classified lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Original text; quotes are stripped for string literals.
    pub value: String,
}

/// All possible token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The empty lexeme; dropped before parsing.
    EmptySpace,

    // ── Keywords ──
    SelectKeyword,
    FromKeyword,
    WhereKeyword,
    OrderByKeyword,
    LimitKeyword,

    // ── Punctuation ──
    /// `||`
    ConcatOperator,
    /// `,`
    CommaDelimiter,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `*`
    Asterisk,

    // ── Literals ──
    /// A single-quoted string literal.
    StringLiteral,
    /// `name(...)` kept as raw text.
    FunctionCallRaw,

    // ── Refined from `Unknown` by the parser ──
    Comparator(ComparisonOperator),
    LogicalOperator(LogicalOperator),
    Identifier,

    /// Anything else.
    Unknown,
}

/// Lexemes with a fixed meaning, keyed by upper-cased text.
static RESERVED: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    HashMap::from([
        ("SELECT", TokenKind::SelectKeyword),
        ("FROM", TokenKind::FromKeyword),
        ("WHERE", TokenKind::WhereKeyword),
        ("ORDER BY", TokenKind::OrderByKeyword),
        ("LIMIT", TokenKind::LimitKeyword),
        ("||", TokenKind::ConcatOperator),
        (",", TokenKind::CommaDelimiter),
        ("(", TokenKind::LeftParen),
        (")", TokenKind::RightParen),
        ("*", TokenKind::Asterisk),
    ])
});

static FUNCTION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\(.*\)$").expect("function call pattern is valid")
});

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Resolve an `Unknown` token into a comparator, a logical operator or an
    /// identifier. Every other kind is returned as is.
    pub fn refine(&self) -> TokenKind {
        if self.kind != TokenKind::Unknown {
            return self.kind;
        }
        if let Some(op) = ComparisonOperator::from_symbol(&self.value) {
            TokenKind::Comparator(op)
        } else if let Some(op) = LogicalOperator::from_word(&self.value) {
            TokenKind::LogicalOperator(op)
        } else {
            TokenKind::Identifier
        }
    }

    /// Whether this is the unreserved word `word` (case-insensitive), such as
    /// `AS` or `UNION`.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Unknown && self.value.eq_ignore_ascii_case(word)
    }
}

// ───────────────────────── Classification ─────────────────────────

/// Classify a single lexeme. First matching rule wins.
pub fn classify_token(raw: &str) -> Token {
    let token = if raw.is_empty() {
        Token::new(TokenKind::EmptySpace, raw)
    } else if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        Token::new(TokenKind::StringLiteral, &raw[1..raw.len() - 1])
    } else if FUNCTION_CALL.is_match(raw) {
        Token::new(TokenKind::FunctionCallRaw, raw)
    } else {
        let key = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        match RESERVED.get(key.as_str()) {
            Some(kind) => Token::new(*kind, raw),
            None => Token::new(TokenKind::Unknown, raw),
        }
    };
    trace!(raw, kind = ?token.kind, "classified token");
    token
}

/// Classify every lexeme. The output has exactly one token per input string.
pub fn classify<S: AsRef<str>>(raw: &[S]) -> Vec<Token> {
    raw.iter().map(|s| classify_token(s.as_ref())).collect()
}

// ───────────────────────── Tests ─────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Helper: classify and return just the token kinds.
    fn kinds(input: &[&str]) -> Vec<TokenKind> {
        classify(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_select_star_from_users() {
        let tokens = kinds(&["SELECT", "*", "FROM", "users", "WHERE", "id", "=", "1"]);
        assert_eq!(
            tokens,
            vec![
                TokenKind::SelectKeyword,
                TokenKind::Asterisk,
                TokenKind::FromKeyword,
                TokenKind::Unknown,
                TokenKind::WhereKeyword,
                TokenKind::Unknown,
                TokenKind::Unknown,
                TokenKind::Unknown,
            ]
        );
    }

    #[test]
    fn test_case_insensitive_keywords_keep_original_text() {
        let tokens = classify(&["select", "FrOm", "Where", "limit"]);
        assert_eq!(tokens[0], Token::new(TokenKind::SelectKeyword, "select"));
        assert_eq!(tokens[1], Token::new(TokenKind::FromKeyword, "FrOm"));
        assert_eq!(tokens[2], Token::new(TokenKind::WhereKeyword, "Where"));
        assert_eq!(tokens[3], Token::new(TokenKind::LimitKeyword, "limit"));
    }

    #[test]
    fn test_order_by_is_one_lexeme() {
        assert_eq!(kinds(&["ORDER BY", "order  by"]), vec![TokenKind::OrderByKeyword; 2]);
        assert_eq!(kinds(&["ORDER", "BY"]), vec![TokenKind::Unknown; 2]);
    }

    #[test]
    fn test_punctuation() {
        let tokens = kinds(&[",", "||", "(", ")", "*"]);
        assert_eq!(
            tokens,
            vec![
                TokenKind::CommaDelimiter,
                TokenKind::ConcatOperator,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Asterisk,
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        let tokens = classify(&["'hello'", "'hello world'", "''"]);
        assert_eq!(tokens[0], Token::new(TokenKind::StringLiteral, "hello"));
        assert_eq!(tokens[1], Token::new(TokenKind::StringLiteral, "hello world"));
        assert_eq!(tokens[2], Token::new(TokenKind::StringLiteral, ""));
    }

    #[test]
    fn test_lone_or_unclosed_quote_is_unknown() {
        assert_eq!(kinds(&["'", "'hello", "world'"]), vec![TokenKind::Unknown; 3]);
    }

    #[test]
    fn test_quoted_keyword_is_literal() {
        let tokens = classify(&["'SELECT'"]);
        assert_eq!(tokens[0], Token::new(TokenKind::StringLiteral, "SELECT"));
    }

    #[test]
    fn test_function_call_keeps_raw_text() {
        let tokens = classify(&["count(*)", "coalesce(a,'x')", "now()"]);
        assert_eq!(tokens[0], Token::new(TokenKind::FunctionCallRaw, "count(*)"));
        assert_eq!(tokens[1], Token::new(TokenKind::FunctionCallRaw, "coalesce(a,'x')"));
        assert_eq!(tokens[2], Token::new(TokenKind::FunctionCallRaw, "now()"));
    }

    #[test]
    fn test_not_function_call_shapes() {
        assert_eq!(
            kinds(&["(a)", "1f(x)", "f(x", "f x)"]),
            vec![TokenKind::Unknown; 4]
        );
    }

    #[test]
    fn test_empty_string_is_empty_space() {
        assert_eq!(kinds(&[""]), vec![TokenKind::EmptySpace]);
    }

    #[test]
    fn test_operators_stay_unknown_until_refined() {
        let tokens = classify(&["=", "<>", "and", "OR", "name", "LIKE"]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Unknown));
        let refined: Vec<TokenKind> = tokens.iter().map(Token::refine).collect();
        assert_eq!(
            refined,
            vec![
                TokenKind::Comparator(ComparisonOperator::Equal),
                TokenKind::Comparator(ComparisonOperator::NotEqual),
                TokenKind::LogicalOperator(LogicalOperator::And),
                TokenKind::LogicalOperator(LogicalOperator::Or),
                TokenKind::Identifier,
                TokenKind::Comparator(ComparisonOperator::Like),
            ]
        );
    }

    #[test]
    fn test_refine_leaves_classified_tokens_alone() {
        let token = Token::new(TokenKind::StringLiteral, "=");
        assert_eq!(token.refine(), TokenKind::StringLiteral);
    }

    #[test]
    fn test_is_word() {
        let token = classify_token("union");
        assert!(token.is_word("UNION"));
        assert!(!token.is_word("ALL"));
        assert!(!classify_token("'union'").is_word("UNION"));
    }

    #[test]
    fn test_empty_input() {
        let empty: [&str; 0] = [];
        assert!(classify(&empty).is_empty());
    }

    proptest! {
        #[test]
        fn classification_is_one_to_one(raw in proptest::collection::vec(".{0,12}", 0..32)) {
            let tokens = classify(&raw);
            prop_assert_eq!(tokens.len(), raw.len());
        }

        #[test]
        fn non_literals_keep_their_text(raw in "[A-Za-z_=<>|,()*]{1,10}") {
            let token = classify_token(&raw);
            prop_assert_eq!(token.value, raw);
        }
    }
}
