//! Literal-list encoding for list columns in the flat CSV artifact.
//!
//! Cells look like `['United States', 'France']` or `[]`. Strings use single
//! quotes unless they contain a single quote and no double quote. Decoding
//! also accepts double-quoted items, backslash escapes and `None` items
//! (dropped).

use std::fmt::Write;

/// Why a list cell could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCodecError {
    /// Input ended inside a string or before `]`
    Unterminated,
    Unexpected { pos: usize, found: char },
    BadEscape { pos: usize },
    TrailingInput { pos: usize },
}

impl std::fmt::Display for ListCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unterminated => write!(f, "unterminated list literal"),
            Self::Unexpected { pos, found } => {
                write!(f, "unexpected '{found}' at offset {pos}")
            }
            Self::BadEscape { pos } => write!(f, "invalid escape at offset {pos}"),
            Self::TrailingInput { pos } => write!(f, "trailing input at offset {pos}"),
        }
    }
}

impl std::error::Error for ListCodecError {}

fn encode_item(out: &mut String, item: &str) {
    let quote = if item.contains('\'') && !item.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in item.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Encode a list as a literal-list cell
pub fn encode_list<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::from("[");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        encode_item(&mut out, item.as_ref());
    }
    out.push(']');
    out
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn next(&mut self) -> Result<(usize, char), ListCodecError> {
        self.chars.next().ok_or(ListCodecError::Unterminated)
    }

    fn peek(&mut self) -> Result<(usize, char), ListCodecError> {
        self.chars.peek().copied().ok_or(ListCodecError::Unterminated)
    }

    fn hex(&mut self, digits: usize, pos: usize) -> Result<char, ListCodecError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let (_, c) = self.next()?;
            let d = c.to_digit(16).ok_or(ListCodecError::BadEscape { pos })?;
            code = code * 16 + d;
        }
        char::from_u32(code).ok_or(ListCodecError::BadEscape { pos })
    }

    fn string(&mut self, quote: char) -> Result<String, ListCodecError> {
        let mut s = String::new();
        loop {
            let (pos, c) = self.next()?;
            match c {
                '\\' => {
                    let (_, e) = self.next()?;
                    match e {
                        '\\' | '\'' | '"' => s.push(e),
                        'n' => s.push('\n'),
                        'r' => s.push('\r'),
                        't' => s.push('\t'),
                        '0' => s.push('\0'),
                        'x' => s.push(self.hex(2, pos)?),
                        'u' => s.push(self.hex(4, pos)?),
                        'U' => s.push(self.hex(8, pos)?),
                        _ => return Err(ListCodecError::BadEscape { pos }),
                    }
                }
                c if c == quote => return Ok(s),
                c => s.push(c),
            }
        }
    }

    /// One item; `None` for the `None` literal
    fn item(&mut self) -> Result<Option<String>, ListCodecError> {
        let (pos, c) = self.next()?;
        match c {
            '\'' | '"' => self.string(c).map(Some),
            'N' => {
                for expected in ['o', 'n', 'e'] {
                    let (pos, found) = self.next()?;
                    if found != expected {
                        return Err(ListCodecError::Unexpected { pos, found });
                    }
                }
                Ok(None)
            }
            found => Err(ListCodecError::Unexpected { pos, found }),
        }
    }

    fn list(&mut self) -> Result<Vec<String>, ListCodecError> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek()?.1 == ']' {
            self.next()?;
            return Ok(items);
        }
        loop {
            self.skip_ws();
            if let Some(item) = self.item()? {
                items.push(item);
            }
            self.skip_ws();
            match self.next()? {
                (_, ']') => return Ok(items),
                (_, ',') => {
                    self.skip_ws();
                    // trailing comma
                    if self.peek()?.1 == ']' {
                        self.next()?;
                        return Ok(items);
                    }
                }
                (pos, found) => return Err(ListCodecError::Unexpected { pos, found }),
            }
        }
    }
}

/// Decode a list cell.
///
/// Blank cells decode to `[]`; cells that do not start with `[` are a
/// single plain element.
pub fn decode_list(cell: &str) -> Result<Vec<String>, ListCodecError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = cell.strip_prefix('[') else {
        return Ok(vec![cell.to_string()]);
    };
    let offset = cell.len() - body.len();
    let mut parser = Parser {
        chars: body.char_indices().peekable(),
    };
    let items = parser.list()?;
    if let Some((pos, _)) = parser.chars.next() {
        return Err(ListCodecError::TrailingInput { pos: pos + offset });
    }
    Ok(items)
}
