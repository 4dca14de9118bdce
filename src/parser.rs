//! SQL parsing wrapper around sqlparser-rs
//!
//! The aggregation compiler consumes parsed ASTs only; this wrapper is the
//! convenience entry point for callers starting from SQL text.

use crate::error::{AggError, Result};
use sqlparser::ast::{Expr, Ident, Select, SetExpr, Statement};
use sqlparser::dialect::{Dialect, GenericDialect};
use sqlparser::keywords::Keyword;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;

/// GenericDialect, except `interval` stays a plain identifier when it names a
/// bucket-function parameter (`interval = '1h'`). sqlparser reserves INTERVAL
/// for interval literals and would reject the equality otherwise.
#[derive(Debug)]
struct AggDialect;

impl Dialect for AggDialect {
    fn is_identifier_start(&self, ch: char) -> bool {
        GenericDialect {}.is_identifier_start(ch)
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        GenericDialect {}.is_identifier_part(ch)
    }

    fn parse_prefix(
        &self,
        parser: &mut Parser,
    ) -> Option<std::result::Result<Expr, ParserError>> {
        let token = parser.peek_token();
        if let Token::Word(word) = &token.token {
            if word.keyword == Keyword::INTERVAL
                && word.quote_style.is_none()
                && parser.peek_nth_token(1).token == Token::Eq
            {
                let name = word.value.clone();
                parser.next_token();
                return Some(Ok(Expr::Identifier(Ident::new(name))));
            }
        }
        None
    }
}

/// Parser front end producing the SELECT body the compiler consumes
pub struct SqlParser;

impl SqlParser {
    /// Parse a single SQL statement
    pub fn parse(sql: &str) -> Result<Statement> {
        let mut statements = Parser::parse_sql(&AggDialect, sql)?;

        if statements.is_empty() {
            return Err(AggError::Parse("empty SQL statement".to_string()));
        }

        if statements.len() > 1 {
            return Err(AggError::UnsupportedStatement(
                "multiple statements not supported".to_string(),
            ));
        }

        Ok(statements.remove(0))
    }

    /// Parse SQL text down to the plain SELECT body
    pub fn parse_select(sql: &str) -> Result<Select> {
        match Self::parse(sql)? {
            Statement::Query(query) => match *query.body {
                SetExpr::Select(select) => Ok(*select),
                other => Err(AggError::UnsupportedStatement(format!(
                    "only plain SELECT queries are supported, got: {}",
                    other
                ))),
            },
            other => Err(AggError::UnsupportedStatement(format!(
                "only SELECT queries are supported, got: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_select() {
        let stmt = SqlParser::parse("SELECT * FROM products").unwrap();
        assert!(matches!(stmt, Statement::Query(_)));
    }

    #[test]
    fn test_parse_select_body() {
        let select = SqlParser::parse_select("SELECT count(*) FROM products").unwrap();
        assert_eq!(select.projection.len(), 1);
    }

    #[test]
    fn test_parse_empty_sql() {
        assert!(matches!(SqlParser::parse(""), Err(AggError::Parse(_))));
    }

    #[test]
    fn test_parse_invalid_sql() {
        assert!(SqlParser::parse("SELEKT * FORM products").is_err());
    }

    #[test]
    fn test_parse_multiple_statements_rejected() {
        let result = SqlParser::parse("SELECT * FROM a; SELECT * FROM b");
        assert!(matches!(result, Err(AggError::UnsupportedStatement(_))));
    }

    #[test]
    fn test_parse_select_rejects_insert() {
        let result = SqlParser::parse_select("INSERT INTO products VALUES (1)");
        assert!(matches!(result, Err(AggError::UnsupportedStatement(_))));
    }

    #[test]
    fn test_parse_interval_as_parameter_name() {
        // INTERVAL must not be treated as a keyword inside bucket-function args
        let select = SqlParser::parse_select(
            "SELECT count(*) FROM t GROUP BY date_histogram(field = 'ts', interval = '1d')",
        )
        .unwrap();
        assert!(matches!(
            select.group_by,
            sqlparser::ast::GroupByExpr::Expressions(_, _)
        ));
    }

    #[test]
    fn test_parse_select_rejects_union() {
        let result = SqlParser::parse_select("SELECT * FROM a UNION SELECT * FROM b");
        assert!(matches!(result, Err(AggError::UnsupportedStatement(_))));
    }
}
