// src/transformer/script.rs

//! Transformer script parsing
//!
//! The script language itself is evaluated by the rewrite engine. This crate
//! only needs a parser at the seam so that malformed scripts fail the run
//! before the engine is ever invoked.

use crate::error::{Error, Result};

/// Parses transformer script sources
pub trait ScriptParser {
    /// Parsed representation handed to the engine
    type Script;

    /// Parse one script
    ///
    /// `name` identifies the script in errors and in the engine; it is the
    /// script's classpath-relative path or its configured file path.
    fn parse(&self, name: &str, source: &[u8]) -> Result<Self::Script>;
}

/// A script that passed structural validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScript {
    pub name: String,
    pub source: String,
}

/// Structural validator for script sources
///
/// Checks that the source is UTF-8, not blank, that string literals and
/// block comments terminate, and that `{}`, `[]` and `()` nest properly.
/// It does not understand the language beyond that.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralParser;

impl StructuralParser {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptParser for StructuralParser {
    type Script = ParsedScript;

    fn parse(&self, name: &str, source: &[u8]) -> Result<ParsedScript> {
        let text = match std::str::from_utf8(source) {
            Ok(text) => text,
            Err(e) => {
                let (line, column) = position_of(&source[..e.valid_up_to()]);
                return Err(parse_error(name, line, column, "invalid utf-8"));
            }
        };

        check_structure(name, text)?;

        Ok(ParsedScript {
            name: name.to_string(),
            source: text.to_string(),
        })
    }
}

fn parse_error(name: &str, line: usize, column: usize, reason: impl Into<String>) -> Error {
    Error::ScriptParse {
        name: name.to_string(),
        line,
        column,
        reason: reason.into(),
    }
}

/// 1-based line and column just past `prefix`
fn position_of(prefix: &[u8]) -> (usize, usize) {
    let text = String::from_utf8_lossy(prefix);
    let line = text.matches('\n').count() + 1;
    let column = text.rsplit('\n').next().map_or(0, |last| last.chars().count()) + 1;
    (line, column)
}

fn closing_for(open: char) -> char {
    match open {
        '{' => '}',
        '[' => ']',
        _ => ')',
    }
}

fn check_structure(name: &str, text: &str) -> Result<()> {
    let mut open: Vec<(char, usize, usize)> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;
    let mut column = 0;
    let mut saw_content = false;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            column = 0;
            continue;
        }
        column += 1;

        match c {
            '/' if chars.peek() == Some(&'/') => {
                // Line comment: skip to end of line, leave the newline
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                let (start_line, start_column) = (line, column);
                chars.next();
                column += 1;
                let mut closed = false;
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        line += 1;
                        column = 0;
                    } else {
                        column += 1;
                    }
                    if prev == '*' && inner == '/' {
                        closed = true;
                        break;
                    }
                    prev = inner;
                }
                if !closed {
                    return Err(parse_error(
                        name,
                        start_line,
                        start_column,
                        "unterminated block comment",
                    ));
                }
            }
            '"' | '\'' => {
                saw_content = true;
                let (start_line, start_column) = (line, column);
                let mut escaped = false;
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                    column += 1;
                    if escaped {
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(parse_error(
                        name,
                        start_line,
                        start_column,
                        "unterminated string literal",
                    ));
                }
            }
            '{' | '[' | '(' => {
                saw_content = true;
                open.push((c, line, column));
            }
            '}' | ']' | ')' => match open.pop() {
                Some((opener, _, _)) if closing_for(opener) == c => {}
                Some((opener, open_line, open_column)) => {
                    return Err(parse_error(
                        name,
                        line,
                        column,
                        format!(
                            "expected '{}' to close '{}' from {}:{}, found '{}'",
                            closing_for(opener),
                            opener,
                            open_line,
                            open_column,
                            c
                        ),
                    ));
                }
                None => {
                    return Err(parse_error(name, line, column, format!("unbalanced '{}'", c)));
                }
            },
            c if !c.is_whitespace() => saw_content = true,
            _ => {}
        }
    }

    if let Some((opener, open_line, open_column)) = open.pop() {
        return Err(parse_error(
            name,
            open_line,
            open_column,
            format!("'{}' is never closed", opener),
        ));
    }

    if !saw_content {
        return Err(parse_error(name, line, column + 1, "script is empty"));
    }

    Ok(())
}
