//! Canonical S-expression nodes
//!
//! Approval keys are S-expressions compared by their canonical text form:
//! UTF-8, LF line endings, the root's children one per line, nested lists of
//! atoms inline, atoms quoted only when they contain whitespace, parentheses
//! or quotes. Printing then parsing a node yields an equal node.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SExprError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected token at byte {0}")]
    UnexpectedToken(usize),
    #[error("trailing input at byte {0}")]
    TrailingInput(usize),
}

impl SExpr {
    pub fn atom(s: impl Into<String>) -> SExpr {
        SExpr::Atom(s.into())
    }

    pub fn list(children: impl IntoIterator<Item = SExpr>) -> SExpr {
        SExpr::List(children.into_iter().collect())
    }

    /// `(name child...)` convenience constructor
    pub fn tagged(name: &str, children: impl IntoIterator<Item = SExpr>) -> SExpr {
        let mut v = vec![SExpr::atom(name)];
        v.extend(children);
        SExpr::List(v)
    }

    pub fn children(&self) -> &[SExpr] {
        match self {
            SExpr::Atom(_) => &[],
            SExpr::List(children) => children,
        }
    }

    fn is_flat(&self) -> bool {
        self.children().iter().all(|c| matches!(c, SExpr::Atom(_)))
    }

    /// The stable comparison form; two keys match iff these strings match
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out, 0);
        out
    }

    fn write_canonical(&self, out: &mut String, indent: usize) {
        match self {
            SExpr::Atom(a) => out.push_str(&quote_atom(a)),
            SExpr::List(children) => {
                if self.is_flat() && indent > 0 {
                    out.push('(');
                    for (i, c) in children.iter().enumerate() {
                        if i > 0 {
                            out.push(' ');
                        }
                        c.write_canonical(out, indent + 1);
                    }
                    out.push(')');
                } else {
                    out.push('(');
                    for (i, c) in children.iter().enumerate() {
                        if i == 0 {
                            c.write_canonical(out, indent + 1);
                        } else {
                            out.push('\n');
                            for _ in 0..=indent {
                                out.push(' ');
                            }
                            c.write_canonical(out, indent + 1);
                        }
                    }
                    out.push('\n');
                    for _ in 0..indent {
                        out.push(' ');
                    }
                    out.push(')');
                }
            }
        }
    }

    pub fn parse(text: &str) -> Result<SExpr, SExprError> {
        let bytes = text.as_bytes();
        let mut pos = 0;
        skip_ws(bytes, &mut pos);
        let node = parse_node(bytes, &mut pos)?;
        skip_ws(bytes, &mut pos);
        if pos != bytes.len() {
            return Err(SExprError::TrailingInput(pos));
        }
        Ok(node)
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_text())
    }
}

fn quote_atom(atom: &str) -> String {
    let needs_quotes = atom.is_empty()
        || atom
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\'));
    if !needs_quotes {
        return atom.to_string();
    }
    let mut out = String::with_capacity(atom.len() + 2);
    out.push('"');
    for c in atom.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn skip_ws(bytes: &[u8], pos: &mut usize) {
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
}

fn parse_node(bytes: &[u8], pos: &mut usize) -> Result<SExpr, SExprError> {
    if *pos >= bytes.len() {
        return Err(SExprError::UnexpectedEnd);
    }
    match bytes[*pos] {
        b'(' => {
            *pos += 1;
            let mut children = Vec::new();
            loop {
                skip_ws(bytes, pos);
                if *pos >= bytes.len() {
                    return Err(SExprError::UnexpectedEnd);
                }
                if bytes[*pos] == b')' {
                    *pos += 1;
                    return Ok(SExpr::List(children));
                }
                children.push(parse_node(bytes, pos)?);
            }
        }
        b')' => Err(SExprError::UnexpectedToken(*pos)),
        b'"' => {
            *pos += 1;
            let mut atom = String::new();
            loop {
                if *pos >= bytes.len() {
                    return Err(SExprError::UnexpectedEnd);
                }
                match bytes[*pos] {
                    b'"' => {
                        *pos += 1;
                        return Ok(SExpr::Atom(atom));
                    }
                    b'\\' => {
                        *pos += 1;
                        if *pos >= bytes.len() {
                            return Err(SExprError::UnexpectedEnd);
                        }
                        match bytes[*pos] {
                            b'n' => atom.push('\n'),
                            other => atom.push(other as char),
                        }
                        *pos += 1;
                    }
                    _ => {
                        // consume one UTF-8 scalar
                        let rest = std::str::from_utf8(&bytes[*pos..])
                            .map_err(|_| SExprError::UnexpectedToken(*pos))?;
                        let c = rest.chars().next().ok_or(SExprError::UnexpectedEnd)?;
                        atom.push(c);
                        *pos += c.len_utf8();
                    }
                }
            }
        }
        _ => {
            let start = *pos;
            while *pos < bytes.len()
                && !bytes[*pos].is_ascii_whitespace()
                && bytes[*pos] != b'('
                && bytes[*pos] != b')'
            {
                *pos += 1;
            }
            let atom = std::str::from_utf8(&bytes[start..*pos])
                .map_err(|_| SExprError::UnexpectedToken(start))?
                .to_string();
            Ok(SExpr::Atom(atom))
        }
    }
}
