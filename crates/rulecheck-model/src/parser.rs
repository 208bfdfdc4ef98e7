//! Script parsing using datafusion-sqlparser-rs
//!
//! Turns one script into the object definitions it contains. Scripts may be
//! split into batches with `GO` separator lines; each batch is parsed on its
//! own. sqlparser does not report statement positions, so a small scanner
//! locates each `CREATE` keyword (skipping comments, strings and quoted
//! identifiers) to recover 1-indexed line/column positions and the raw
//! source fragment of every statement.

use regex::Regex;
use rulecheck_core::{ElementRef, ObjectKind, ScriptDialect};
use sqlparser::ast::{ColumnOption, ObjectName, SchemaName, Statement, TableConstraint};
use sqlparser::dialect::{Dialect, GenericDialect, MsSqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

/// One object defined by a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub element: ElementRef,

    /// Start line (1-indexed)
    pub line: u32,

    /// Start column (1-indexed)
    pub column: u32,

    /// Raw source text of the defining statement
    pub fragment: String,

    /// Declared data type (columns only)
    pub data_type: Option<String>,

    /// Table declares a primary key
    pub has_primary_key: bool,
}

/// A script that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ScriptParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

/// SQL script parser with configurable dialect
pub struct ScriptParser {
    dialect: Box<dyn Dialect>,
    default_schema: String,
}

impl ScriptParser {
    /// Create a parser for a dialect; unqualified names land in `default_schema`
    pub fn new(dialect: ScriptDialect, default_schema: impl Into<String>) -> Self {
        let dialect: Box<dyn Dialect> = match dialect {
            ScriptDialect::MsSql => Box::new(MsSqlDialect {}),
            ScriptDialect::Postgres => Box::new(PostgreSqlDialect {}),
            ScriptDialect::Generic => Box::new(GenericDialect {}),
        };

        Self {
            dialect,
            default_schema: default_schema.into(),
        }
    }

    /// Parse a whole script into definitions, in source order
    pub fn parse(&self, script: &str) -> Result<Vec<Definition>, ScriptParseError> {
        let mut definitions = Vec::new();
        for batch in split_batches(script) {
            self.parse_batch(script, &batch, &mut definitions)?;
        }
        Ok(definitions)
    }

    /// Parse raw SQL into statements (no batch splitting)
    pub fn parse_statements(&self, sql: &str) -> Result<Vec<Statement>, ScriptParseError> {
        Parser::parse_sql(&*self.dialect, sql).map_err(|e| {
            let message = e.to_string();
            let (line, column) = parser_error_position(&message).unwrap_or((1, 1));
            ScriptParseError { message, line, column }
        })
    }

    fn parse_batch(
        &self,
        script: &str,
        batch: &Batch<'_>,
        definitions: &mut Vec<Definition>,
    ) -> Result<(), ScriptParseError> {
        let statements = self.parse_statements(batch.text).map_err(|mut err| {
            let (batch_line, _) = line_col(script, batch.offset);
            err.line += batch_line - 1;
            err
        })?;

        let lexed = scan(batch.text);
        let starts: Vec<usize> = lexed
            .words
            .iter()
            .filter(|w| !w.quoted && w.text.eq_ignore_ascii_case("create"))
            .map(|w| w.start)
            .collect();

        let mut next_create = 0;
        for statement in &statements {
            let rendered = statement.to_string();
            if !rendered.trim_start().to_ascii_uppercase().starts_with("CREATE") {
                tracing::debug!(statement = %rendered, "Skipping non-CREATE statement");
                continue;
            }

            let start = starts.get(next_create).copied().unwrap_or(0);
            next_create += 1;
            let next_start = starts.get(next_create).copied();
            let end = lexed.statement_end(start, next_start, batch.text.len());
            let end = through_line_comment(batch.text, end, next_start.unwrap_or(batch.text.len()));

            let located = Located {
                script,
                local: &batch.text[start..end],
                offset: batch.offset + start,
            };
            self.collect(statement, &located, definitions);
        }

        Ok(())
    }

    fn collect(&self, statement: &Statement, located: &Located<'_>, definitions: &mut Vec<Definition>) {
        let (line, column) = line_col(located.script, located.offset);
        let fragment = located.local.trim_end().to_string();
        let definition = |element: ElementRef| Definition {
            element,
            line,
            column,
            fragment: fragment.clone(),
            data_type: None,
            has_primary_key: false,
        };

        match statement {
            Statement::CreateTable(create) => {
                let table = self.qualify(ObjectKind::Table, &create.name);
                let has_primary_key = create
                    .constraints
                    .iter()
                    .any(|c| matches!(c, TableConstraint::PrimaryKey { .. }))
                    || create.columns.iter().any(|col| {
                        col.options
                            .iter()
                            .any(|o| matches!(o.option, ColumnOption::Unique { is_primary: true, .. }))
                    });

                definitions.push(Definition {
                    has_primary_key,
                    ..definition(table.clone())
                });

                let words = scan(located.local).words;
                let mut cursor = located.local.find('(').unwrap_or(0);
                for col in &create.columns {
                    let name = col.name.value.clone();
                    let found = words
                        .iter()
                        .find(|w| w.start > cursor && w.text.eq_ignore_ascii_case(&name));
                    let (col_line, col_column) = match found {
                        Some(word) => {
                            cursor = word.start;
                            line_col(located.script, located.offset + word.start)
                        }
                        None => (line, column),
                    };

                    let mut parts = table.parts.clone();
                    parts.push(name);
                    definitions.push(Definition {
                        line: col_line,
                        column: col_column,
                        data_type: Some(col.data_type.to_string()),
                        ..definition(ElementRef::new(ObjectKind::Column, parts))
                    });
                }
            }
            Statement::CreateView { name, .. } => {
                definitions.push(definition(self.qualify(ObjectKind::View, name)));
            }
            Statement::CreateIndex(index) => {
                let table = self.qualify(ObjectKind::Table, &index.table_name);
                let index_name = index
                    .name
                    .as_ref()
                    .map(last_ident)
                    .unwrap_or_else(|| format!("IX_{}", table.name()));

                let mut parts = table.parts;
                parts.push(index_name);
                definitions.push(definition(ElementRef::new(ObjectKind::Index, parts)));
            }
            Statement::CreateSchema { schema_name, .. } => {
                let name = match schema_name {
                    SchemaName::Simple(name) => last_ident(name),
                    other => other.to_string(),
                };
                definitions.push(definition(ElementRef::new(ObjectKind::Schema, vec![name])));
            }
            other => {
                tracing::debug!(statement = %other, "Ignoring unsupported CREATE statement");
            }
        }
    }

    /// Qualify a name as `[schema, object]`
    fn qualify(&self, kind: ObjectKind, name: &ObjectName) -> ElementRef {
        let idents: Vec<String> = name.0.iter().map(|i| i.value.clone()).collect();
        let parts = match idents.len() {
            0 => vec![self.default_schema.clone(), String::new()],
            1 => vec![self.default_schema.clone(), idents[0].clone()],
            n => idents[n - 2..].to_vec(),
        };
        ElementRef::new(kind, parts)
    }
}

/// Statement text plus its absolute offset in the script
struct Located<'a> {
    script: &'a str,
    local: &'a str,
    offset: usize,
}

fn last_ident(name: &ObjectName) -> String {
    name.0.last().map(|i| i.value.clone()).unwrap_or_default()
}

/// A `GO`-separated batch and its byte offset in the script
struct Batch<'a> {
    text: &'a str,
    offset: usize,
}

fn split_batches(script: &str) -> Vec<Batch<'_>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    for line in script.split_inclusive('\n') {
        let trimmed = line.trim().trim_end_matches(';').trim();
        if trimmed.eq_ignore_ascii_case("go") {
            batches.push(Batch {
                text: &script[start..pos],
                offset: start,
            });
            start = pos + line.len();
        }
        pos += line.len();
    }

    batches.push(Batch {
        text: &script[start..],
        offset: start,
    });
    batches
}

/// 1-indexed line and column of a byte offset
pub(crate) fn line_col(text: &str, offset: usize) -> (u32, u32) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().unwrap_or("").chars().count() + 1;
    (line as u32, column as u32)
}

fn parser_error_position(message: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"Line: (\d+), Column: (\d+)").ok()?;
    let caps = re.captures(message)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

#[derive(Debug)]
struct Word {
    start: usize,
    text: String,
    quoted: bool,
}

#[derive(Debug, Default)]
struct Lexed {
    words: Vec<Word>,
    semicolons: Vec<usize>,
}

impl Lexed {
    /// End of the statement starting at `start`: just past its `;`, or the
    /// start of the next statement, or the end of the batch
    fn statement_end(&self, start: usize, next_start: Option<usize>, len: usize) -> usize {
        let limit = next_start.unwrap_or(len);
        self.semicolons
            .iter()
            .find(|&&pos| pos > start && pos < limit)
            .map(|pos| pos + 1)
            .unwrap_or(limit)
    }
}

/// Extend `end` over a `--` comment on the rest of its line
fn through_line_comment(text: &str, end: usize, limit: usize) -> usize {
    if end >= limit {
        return end;
    }
    let rest = text[end..limit].split('\n').next().unwrap_or("");
    if rest.trim_start().starts_with("--") {
        end + rest.trim_end().len()
    } else {
        end
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '@' || c == '#'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$')
}

/// Find words, quoted identifiers and top-level semicolons
fn scan(text: &str) -> Lexed {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut lexed = Lexed::default();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|&(_, c)| c);

    while i < chars.len() {
        let (pos, c) = chars[i];
        match c {
            '-' if peek(i + 1) == Some('-') => {
                while i < chars.len() && chars[i].1 != '\n' {
                    i += 1;
                }
            }
            '/' if peek(i + 1) == Some('*') => {
                i += 2;
                while i < chars.len() && !(chars[i].1 == '*' && peek(i + 1) == Some('/')) {
                    i += 1;
                }
                i += 2;
            }
            '\'' => {
                i += 1;
                while i < chars.len() && chars[i].1 != '\'' {
                    i += 1;
                }
                i += 1;
            }
            '[' | '"' => {
                let close = if c == '[' { ']' } else { '"' };
                let mut text = String::new();
                i += 1;
                while i < chars.len() && chars[i].1 != close {
                    text.push(chars[i].1);
                    i += 1;
                }
                lexed.words.push(Word { start: pos, text, quoted: true });
                i += 1;
            }
            ';' => {
                lexed.semicolons.push(pos);
                i += 1;
            }
            c if is_ident_start(c) => {
                let mut text = String::new();
                while i < chars.len() && is_ident_char(chars[i].1) {
                    text.push(chars[i].1);
                    i += 1;
                }
                lexed.words.push(Word { start: pos, text, quoted: false });
            }
            _ => i += 1,
        }
    }

    lexed
}
