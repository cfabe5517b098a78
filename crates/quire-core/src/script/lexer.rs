//! Tokenizer for script cells.
//!
//! Produces `Indent`/`Dedent` tokens from leading whitespace. Newlines inside
//! brackets and after a trailing backslash do not end a logical line.

use super::error::{ErrorKind, ScriptError};

/// Operators and delimiters, longest first.
const OPERATORS: &[&str] = &[
    "**=", "//=", "**", "//", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "+", "-", "*",
    "/", "%", "<", ">", "=", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";",
];

/// Deepest bracket nesting accepted, as in CPython's tokenizer.
pub const MAX_PAREN_LEVEL: usize = 200;

/// Deepest block indentation accepted.
const MAX_INDENT_LEVEL: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Op(&'static str),
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

/// Tokenize cell source.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        depth: 0,
        indents: vec![0],
        tokens: Vec::new(),
        at_line_start: true,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    /// Open bracket nesting
    depth: usize,
    indents: Vec<usize>,
    tokens: Vec<Token>,
    at_line_start: bool,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, tok: Tok) {
        self.tokens.push(Token {
            tok,
            line: self.line,
        });
    }

    fn run(&mut self) -> Result<(), ScriptError> {
        while self.pos < self.chars.len() {
            if self.at_line_start && self.depth == 0 {
                let width = self.measure_indent();
                match self.peek() {
                    None => break,
                    Some('\n') | Some('#') => {
                        // Blank and comment-only lines never affect indentation
                        self.skip_comment();
                        if self.peek() == Some('\n') {
                            self.pos += 1;
                            self.line += 1;
                        }
                        continue;
                    }
                    Some(_) => {
                        self.indent_to(width)?;
                        self.at_line_start = false;
                    }
                }
            }

            let Some(c) = self.peek() else { break };
            match c {
                '\n' => {
                    self.pos += 1;
                    if self.depth == 0 {
                        self.push(Tok::Newline);
                        self.at_line_start = true;
                    }
                    self.line += 1;
                }
                ' ' | '\t' | '\r' | '\x0c' => self.pos += 1,
                '#' => self.skip_comment(),
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                c if c.is_ascii_digit() => self.number()?,
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.name_or_string()?,
                '"' | '\'' => {
                    let s = self.string(false)?;
                    self.push(Tok::Str(s));
                }
                _ => self.operator()?,
            }
        }

        if self.depth > 0 {
            return Err(ScriptError::syntax(self.line, "unexpected EOF: bracket was never closed"));
        }
        if self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.tok, Tok::Newline))
        {
            self.push(Tok::Newline);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(Tok::Dedent);
        }
        self.push(Tok::Eof);
        Ok(())
    }

    fn measure_indent(&mut self) -> usize {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\r' | '\x0c' => {}
                _ => break,
            }
            self.pos += 1;
        }
        width
    }

    fn indent_to(&mut self, width: usize) -> Result<(), ScriptError> {
        let current = *self.indents.last().unwrap_or(&0);
        if width > current {
            if self.indents.len() > MAX_INDENT_LEVEL {
                return Err(ScriptError::new(
                    ErrorKind::IndentationError,
                    "too many levels of indentation",
                )
                .at_line(self.line));
            }
            self.indents.push(width);
            self.push(Tok::Indent);
        } else if width < current {
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                self.push(Tok::Dedent);
            }
            if self.indents.last() != Some(&width) {
                return Err(ScriptError::new(
                    ErrorKind::IndentationError,
                    "unindent does not match any outer indentation level",
                )
                .at_line(self.line));
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) {
        if self.peek() == Some('#') {
            while self.peek().is_some_and(|c| c != '\n') {
                self.pos += 1;
            }
        }
    }

    fn number(&mut self) -> Result<(), ScriptError> {
        let start = self.pos;
        let mut is_float = false;

        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            self.digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+') | Some('-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += 1 + sign;
                self.digits();
            }
        }

        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|&&c| c != '_')
            .collect();

        let tok = if is_float {
            text.parse::<f64>()
                .map(Tok::Float)
                .map_err(|_| ScriptError::syntax(self.line, format!("invalid number '{text}'")))?
        } else {
            text.parse::<i64>().map(Tok::Int).map_err(|_| {
                ScriptError::syntax(self.line, format!("integer literal too large: {text}"))
            })?
        };
        self.push(tok);
        Ok(())
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.pos += 1;
        }
    }

    fn name_or_string(&mut self) -> Result<(), ScriptError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        // Raw string prefix
        if matches!(name.as_str(), "r" | "R") && matches!(self.peek(), Some('"') | Some('\'')) {
            let s = self.string(true)?;
            self.push(Tok::Str(s));
            return Ok(());
        }
        if matches!(self.peek(), Some('"') | Some('\'')) && name.len() <= 2 {
            return Err(ScriptError::syntax(
                self.line,
                format!("string prefix '{name}' is not supported"),
            ));
        }

        self.push(Tok::Name(name));
        Ok(())
    }

    fn string(&mut self, raw: bool) -> Result<String, ScriptError> {
        let quote = self.peek().unwrap_or('"');
        let start_line = self.line;
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(ScriptError::syntax(start_line, "unterminated string literal"));
            };
            if c == quote
                && (!triple || (self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote)))
            {
                self.pos += if triple { 3 } else { 1 };
                return Ok(out);
            }
            if c == '\n' {
                if !triple {
                    return Err(ScriptError::syntax(start_line, "unterminated string literal"));
                }
                self.line += 1;
            }
            if c == '\\' && !raw {
                let escaped = self.peek_at(1);
                self.pos += 2;
                match escaped {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    Some('\n') => self.line += 1,
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => {
                        return Err(ScriptError::syntax(start_line, "unterminated string literal"));
                    }
                }
                continue;
            }
            out.push(c);
            self.pos += 1;
        }
    }

    fn operator(&mut self) -> Result<(), ScriptError> {
        for op in OPERATORS {
            let len = op.chars().count();
            let matches = op
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c));
            if !matches {
                continue;
            }

            match *op {
                "(" | "[" | "{" => {
                    if self.depth >= MAX_PAREN_LEVEL {
                        return Err(ScriptError::syntax(self.line, "too many nested parentheses"));
                    }
                    self.depth += 1;
                }
                ")" | "]" | "}" => {
                    if self.depth == 0 {
                        return Err(ScriptError::syntax(self.line, format!("unmatched '{op}'")));
                    }
                    self.depth -= 1;
                }
                _ => {}
            }
            self.pos += len;
            self.push(Tok::Op(op));
            return Ok(());
        }

        let c = self.peek().unwrap_or(' ');
        Err(ScriptError::syntax(
            self.line,
            format!("invalid character '{c}'"),
        ))
    }
}
