use std::fmt::{self, Display, Formatter};

use anyhow::{bail, Context, Result};

use crate::Capacity;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    NotEqual,
}

impl Comparison {
    pub fn apply(self, lhs: Capacity, rhs: Capacity) -> bool {
        match self {
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterEqual => lhs >= rhs,
            Comparison::Less => lhs < rhs,
            Comparison::LessEqual => lhs <= rhs,
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::GreaterEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
        }
    }
}

/// A logic predicate over the inventory, parsed once when world data is loaded.
#[derive(Clone, Debug, PartialEq)]
pub enum Requirement {
    Free,
    Never,
    /// Satisfied when at least one copy of the item (or door) is owned.
    Item(String),
    Count {
        item: String,
        cmp: Comparison,
        value: Capacity,
    },
    And(Vec<Requirement>),
    Or(Vec<Requirement>),
}

impl Requirement {
    pub fn make_and(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                return Requirement::Never;
            } else if let Requirement::Free = req {
                continue;
            } else if let Requirement::And(and_reqs) = req {
                out_reqs.extend(and_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        match out_reqs.len() {
            0 => Requirement::Free,
            1 => out_reqs.pop().unwrap_or(Requirement::Free),
            _ => Requirement::And(out_reqs),
        }
    }

    pub fn make_or(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                continue;
            } else if let Requirement::Free = req {
                return Requirement::Free;
            } else if let Requirement::Or(or_reqs) = req {
                out_reqs.extend(or_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        match out_reqs.len() {
            0 => Requirement::Never,
            1 => out_reqs.pop().unwrap_or(Requirement::Never),
            _ => Requirement::Or(out_reqs),
        }
    }

    /// Parses a logic expression such as `redWax > 0 && (D17Z01S04[N] || D17Z01S04[FrontR])`.
    /// A blank expression places no requirement.
    pub fn parse(expr: &str) -> Result<Requirement> {
        let tokens = tokenize(expr).with_context(|| format!("invalid logic '{expr}'"))?;
        if tokens.is_empty() {
            return Ok(Requirement::Free);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let req = parser
            .parse_or()
            .with_context(|| format!("invalid logic '{expr}'"))?;
        if parser.pos != parser.tokens.len() {
            bail!(
                "invalid logic '{expr}': unexpected {:?} at token {}",
                parser.tokens[parser.pos],
                parser.pos
            );
        }
        Ok(req)
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Free => write!(f, "true"),
            Requirement::Never => write!(f, "false"),
            Requirement::Item(item) => write!(f, "{item}"),
            Requirement::Count { item, cmp, value } => {
                write!(f, "{item} {} {value}", cmp.symbol())
            }
            Requirement::And(reqs) => write_joined(f, reqs, " && "),
            Requirement::Or(reqs) => write_joined(f, reqs, " || "),
        }
    }
}

fn write_joined(f: &mut Formatter<'_>, reqs: &[Requirement], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, req) in reqs.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{req}")?;
    }
    write!(f, ")")
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Number(Capacity),
    Cmp(Comparison),
    And,
    Or,
    LParen,
    RParen,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '-')
}

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = vec![];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            _ if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '>' | '<' | '=' | '!' => {
                let (cmp, len) = match (c, next) {
                    ('>', Some('=')) => (Comparison::GreaterEqual, 2),
                    ('>', _) => (Comparison::Greater, 1),
                    ('<', Some('=')) => (Comparison::LessEqual, 2),
                    ('<', _) => (Comparison::Less, 1),
                    ('=', Some('=')) => (Comparison::Equal, 2),
                    ('!', Some('=')) => (Comparison::NotEqual, 2),
                    _ => bail!("unexpected '{c}' at offset {i}"),
                };
                tokens.push(Token::Cmp(cmp));
                i += len;
            }
            _ if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && is_ident_char(chars[i]) {
                    // Identifiers may start with a digit, e.g. door suffixes.
                    while i < chars.len() && is_ident_char(chars[i]) {
                        i += 1;
                    }
                    tokens.push(Token::Ident(chars[start..i].iter().collect()));
                } else {
                    let digits: String = chars[start..i].iter().collect();
                    tokens.push(Token::Number(digits.parse()?));
                }
            }
            _ if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => bail!("unexpected '{c}' at offset {i}"),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_or(&mut self) -> Result<Requirement> {
        let mut reqs = vec![self.parse_and()?];
        while let Some(Token::Or) = self.peek() {
            self.pos += 1;
            reqs.push(self.parse_and()?);
        }
        Ok(Requirement::make_or(reqs))
    }

    fn parse_and(&mut self) -> Result<Requirement> {
        let mut reqs = vec![self.parse_atom()?];
        while let Some(Token::And) = self.peek() {
            self.pos += 1;
            reqs.push(self.parse_atom()?);
        }
        Ok(Requirement::make_and(reqs))
    }

    fn parse_atom(&mut self) -> Result<Requirement> {
        match self.next() {
            Some(Token::LParen) => {
                let req = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(req),
                    other => bail!("expected ')' but found {:?}", other),
                }
            }
            Some(Token::Ident(name)) => {
                if let Some(&Token::Cmp(cmp)) = self.peek() {
                    self.pos += 1;
                    let value = match self.next() {
                        Some(Token::Number(n)) => n,
                        other => bail!("expected number after '{}' but found {:?}", name, other),
                    };
                    return Ok(Requirement::Count {
                        item: name,
                        cmp,
                        value,
                    });
                }
                match name.as_str() {
                    "true" => Ok(Requirement::Free),
                    "false" => Ok(Requirement::Never),
                    _ => Ok(Requirement::Item(name)),
                }
            }
            other => bail!("unexpected {:?}", other),
        }
    }
}
