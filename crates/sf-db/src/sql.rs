//! Statement splitting and `@name` placeholder rewriting.
//!
//! Scripts are written with named placeholders (`@AppName`). Drivers bind
//! positionally, so each statement is rewritten to `?` markers and the bound
//! values are collected in the order the markers appear. Both passes run over
//! the sqlparser token stream, so string literals of every form, quoted
//! identifiers, dollar-quoted bodies and comments are copied verbatim.
//! An `@ident` that does not name a bound parameter is left untouched.

use crate::error::{DbError, DbResult};
use sf_core::ResolvedParameter;
use sqlparser::dialect::{Dialect, DuckDbDialect};
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer};

/// A statement rewritten for positional binding
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement<'p> {
    /// SQL with `?` in place of each recognised placeholder
    pub sql: String,
    /// Parameters in marker order; a name used twice appears twice
    pub values: Vec<&'p ResolvedParameter>,
}

/// DuckDB lexing plus `E'...'` escape strings, which DuckDB accepts
#[derive(Debug, Default)]
struct ScriptDialect(DuckDbDialect);

impl Dialect for ScriptDialect {
    fn is_identifier_start(&self, ch: char) -> bool {
        self.0.is_identifier_start(ch)
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        self.0.is_identifier_part(ch)
    }

    fn supports_string_escape_constant(&self) -> bool {
        true
    }
}

/// Tokens of `sql` with their byte ranges in the source text
struct Lexed<'a> {
    sql: &'a str,
    tokens: Vec<TokenWithSpan>,
    line_starts: Vec<usize>,
}

impl<'a> Lexed<'a> {
    fn new(sql: &'a str) -> DbResult<Self> {
        let dialect = ScriptDialect::default();
        let tokens = Tokenizer::new(&dialect, sql)
            .with_unescape(false)
            .tokenize_with_location()
            .map_err(|e| DbError::TokenizeError(e.to_string()))?;

        let line_starts = std::iter::once(0)
            .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Ok(Self {
            sql,
            tokens,
            line_starts,
        })
    }

    /// Byte offset of a 1-based line/column location (columns count chars)
    fn offset(&self, location: Location) -> usize {
        let line = (location.line as usize).saturating_sub(1);
        let Some(&start) = self.line_starts.get(line) else {
            return self.sql.len();
        };
        let column = (location.column as usize).saturating_sub(1);
        self.sql[start..]
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
            .unwrap_or(self.sql.len())
    }

    fn start(&self, index: usize) -> usize {
        self.offset(self.tokens[index].span.start)
    }

    fn end(&self, index: usize) -> usize {
        self.offset(self.tokens[index].span.end)
    }
}

/// Split a script into statements on top-level `;`.
///
/// Empty statements (whitespace or comments only) are dropped.
pub fn split_statements(sql: &str) -> DbResult<Vec<&str>> {
    let lexed = Lexed::new(sql)?;

    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_code = false;
    for (index, item) in lexed.tokens.iter().enumerate() {
        match item.token {
            Token::SemiColon => {
                let cut = lexed.start(index);
                if has_code {
                    statements.push(sql[start..cut].trim());
                }
                start = (cut + 1).min(sql.len());
                has_code = false;
            }
            Token::Whitespace(_) => {}
            _ => has_code = true,
        }
    }
    if has_code {
        statements.push(sql[start..].trim());
    }
    Ok(statements)
}

/// Rewrite the `@name` placeholders of one statement to `?` markers
pub fn bind_named<'p>(sql: &str, params: &'p [ResolvedParameter]) -> DbResult<BoundStatement<'p>> {
    if params.is_empty() {
        return Ok(BoundStatement {
            sql: sql.to_string(),
            values: Vec::new(),
        });
    }

    let lexed = Lexed::new(sql)?;
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut copied = 0;

    // `@name` lexes as an at-sign immediately followed by an unquoted word
    for (index, pair) in lexed.tokens.windows(2).enumerate() {
        let (Token::AtSign, Token::Word(word)) = (&pair[0].token, &pair[1].token) else {
            continue;
        };
        if word.quote_style.is_some() {
            continue;
        }
        let Some(param) = params.iter().find(|p| p.name == word.value) else {
            continue;
        };

        let start = lexed.start(index);
        out.push_str(&sql[copied..start]);
        out.push('?');
        values.push(param);
        copied = lexed.end(index + 1);
    }
    out.push_str(&sql[copied..]);

    Ok(BoundStatement { sql: out, values })
}

#[cfg(test)]
#[path = "sql_test.rs"]
mod tests;
