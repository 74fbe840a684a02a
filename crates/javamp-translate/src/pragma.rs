//! Pragma recognition and clause parsing.
//!
//! A pragma is a line comment of the form `// omp <kind> <clause>*`.
//! Comments that do not open with the `omp` marker are ordinary comments;
//! anything after the marker must parse completely or the pragma is
//! rejected, so a half-understood pragma can never silently serialize a
//! program.


use logos::Logos;

use javamp_core::{Clauses, DirectiveKind, ReductionOp};

/// Marker word that opens every pragma comment.
pub const MARKER: &str = "omp";

/// A parsed pragma, not yet attached to a region.
#[derive(Clone, Debug)]
pub struct ParsedPragma {
    pub kind: DirectiveKind,
    pub clauses: Clauses,
}

/// A pragma rejection, positioned relative to the payload start.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PragmaError {
    pub message: String,
    pub offset: usize,
}

impl PragmaError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Extract the pragma payload from a line comment.
///
/// Returns the byte offset of the payload within the comment text plus the
/// payload itself, or `None` when the comment is not a pragma at all.
/// A bare `// omp` returns an empty payload so the parser can reject it
/// loudly instead of dropping it.
pub fn pragma_payload(comment: &str) -> Option<(usize, &str)> {
    let rest = comment.strip_prefix("//")?;
    let trimmed = rest.trim_start();
    let mut offset = 2 + (rest.len() - trimmed.len());
    let after = trimmed.strip_prefix(MARKER)?;
    match after.chars().next() {
        Some(c) if !c.is_whitespace() => return None,
        _ => {}
    }
    offset += MARKER.len();
    Some((offset, after))
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
enum Tok {
    #[token("parallel")]
    Parallel,
    #[token("for")]
    For,
    #[token("sections")]
    Sections,
    #[token("section")]
    Section,
    #[token("single")]
    Single,
    #[token("master")]
    Master,
    #[token("critical")]
    Critical,
    #[token("barrier")]
    Barrier,
    #[token("atomic")]
    Atomic,

    #[token("private")]
    Private,
    #[token("firstprivate")]
    FirstPrivate,
    #[token("shared")]
    Shared,
    #[token("public")]
    Public,
    #[token("reduction")]
    Reduction,
    #[token("threadNum")]
    ThreadNum,
    #[token("num_threads")]
    NumThreads,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("+")]
    Plus,
    #[token("*")]
    Star,
    #[token("-")]
    Minus,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u32>().ok())]
    Int(u32),
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_owned())]
    Ident(String),
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Ident(name) => format!("`{name}`"),
        Tok::Int(n) => format!("`{n}`"),
        other => format!("`{}`", keyword_text(other)),
    }
}

fn keyword_text(tok: &Tok) -> &'static str {
    match tok {
        Tok::Parallel => "parallel",
        Tok::For => "for",
        Tok::Sections => "sections",
        Tok::Section => "section",
        Tok::Single => "single",
        Tok::Master => "master",
        Tok::Critical => "critical",
        Tok::Barrier => "barrier",
        Tok::Atomic => "atomic",
        Tok::Private => "private",
        Tok::FirstPrivate => "firstprivate",
        Tok::Shared => "shared",
        Tok::Public => "public",
        Tok::Reduction => "reduction",
        Tok::ThreadNum => "threadNum",
        Tok::NumThreads => "num_threads",
        Tok::LParen => "(",
        Tok::RParen => ")",
        Tok::Comma => ",",
        Tok::Colon => ":",
        Tok::Plus => "+",
        Tok::Star => "*",
        Tok::Minus => "-",
        Tok::AndAnd => "&&",
        Tok::OrOr => "||",
        Tok::Amp => "&",
        Tok::Pipe => "|",
        Tok::Caret => "^",
        Tok::Int(_) | Tok::Ident(_) => unreachable!(),
    }
}

struct TokenStream {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
    end: usize,
}

impl TokenStream {
    fn lex(payload: &str) -> Result<Self, PragmaError> {
        let mut tokens = Vec::new();
        for (result, span) in Tok::lexer(payload).spanned() {
            match result {
                Ok(tok) => tokens.push((tok, span.start)),
                Err(()) => {
                    return Err(PragmaError::new(
                        format!("unrecognized pragma token `{}`", &payload[span.clone()]),
                        span.start,
                    ));
                }
            }
        }
        Ok(Self {
            tokens,
            pos: 0,
            end: payload.len(),
        })
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<(Tok, usize)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, o)| *o)
            .unwrap_or(self.end)
    }

    fn expect(&mut self, want: Tok, what: &str) -> Result<usize, PragmaError> {
        let offset = self.offset();
        match self.next() {
            Some((tok, off)) if tok == want => Ok(off),
            Some((tok, off)) => Err(PragmaError::new(
                format!("expected {what}, found {}", describe(&tok)),
                off,
            )),
            None => Err(PragmaError::new(format!("expected {what}"), offset)),
        }
    }
}

/// Parse one pragma payload (the text after the `omp` marker).
pub fn parse(payload: &str) -> Result<ParsedPragma, PragmaError> {
    let mut stream = TokenStream::lex(payload)?;

    let kind = parse_kind(&mut stream)?;
    let mut clauses = Clauses::default();
    while let Some((tok, offset)) = stream.next() {
        if !kind.is_spawning() {
            return Err(PragmaError::new(
                format!("directive `{kind}` takes no clauses"),
                offset,
            ));
        }
        match tok {
            Tok::Private => parse_name_list(&mut stream, &mut clauses, SharingClause::Private)?,
            Tok::FirstPrivate => {
                parse_name_list(&mut stream, &mut clauses, SharingClause::FirstPrivate)?
            }
            Tok::Shared | Tok::Public => {
                parse_name_list(&mut stream, &mut clauses, SharingClause::Shared)?
            }
            Tok::Reduction => parse_reduction(&mut stream, &mut clauses)?,
            Tok::ThreadNum | Tok::NumThreads => {
                stream.expect(Tok::LParen, "`(`")?;
                let offset = stream.offset();
                match stream.next() {
                    Some((Tok::Int(n), _)) if n > 0 => clauses.thread_num = Some(n),
                    Some((Tok::Int(_), off)) => {
                        return Err(PragmaError::new("threadNum must be positive", off));
                    }
                    other => {
                        return Err(PragmaError::new(
                            "threadNum expects an integer literal",
                            other.map(|(_, o)| o).unwrap_or(offset),
                        ));
                    }
                }
                stream.expect(Tok::RParen, "`)`")?;
            }
            other => {
                return Err(PragmaError::new(
                    format!("unexpected {} in pragma", describe(&other)),
                    offset,
                ));
            }
        }
    }
    Ok(ParsedPragma { kind, clauses })
}

fn parse_kind(stream: &mut TokenStream) -> Result<DirectiveKind, PragmaError> {
    let offset = stream.offset();
    let Some((tok, off)) = stream.next() else {
        return Err(PragmaError::new("missing directive kind", offset));
    };
    let kind = match tok {
        Tok::Parallel => {
            if stream.peek() == Some(&Tok::For) {
                stream.next();
                DirectiveKind::ParallelFor
            } else {
                DirectiveKind::Parallel
            }
        }
        Tok::For => DirectiveKind::For,
        Tok::Sections => DirectiveKind::Sections,
        Tok::Section => DirectiveKind::Section,
        Tok::Single => DirectiveKind::Single,
        Tok::Master => DirectiveKind::Master,
        Tok::Critical => DirectiveKind::Critical,
        Tok::Barrier => DirectiveKind::Barrier,
        Tok::Atomic => DirectiveKind::Atomic,
        other => {
            return Err(PragmaError::new(
                format!("unknown directive kind {}", describe(&other)),
                off,
            ));
        }
    };
    Ok(kind)
}

enum SharingClause {
    Private,
    FirstPrivate,
    Shared,
}

fn insert_name(
    clauses: &mut Clauses,
    clause: &SharingClause,
    name: String,
    offset: usize,
) -> Result<(), PragmaError> {
    if clauses.mentions(&name) {
        return Err(PragmaError::new(
            format!("name `{name}` already has a data-sharing attribute"),
            offset,
        ));
    }
    match clause {
        SharingClause::Private => clauses.private_vars.insert(name),
        SharingClause::FirstPrivate => clauses.firstprivate_vars.insert(name),
        SharingClause::Shared => clauses.shared_vars.insert(name),
    };
    Ok(())
}

fn parse_name_list(
    stream: &mut TokenStream,
    clauses: &mut Clauses,
    clause: SharingClause,
) -> Result<(), PragmaError> {
    stream.expect(Tok::LParen, "`(`")?;
    loop {
        let offset = stream.offset();
        match stream.next() {
            Some((Tok::Ident(name), off)) => insert_name(clauses, &clause, name, off)?,
            Some((tok, off)) => {
                return Err(PragmaError::new(
                    format!("expected a variable name, found {}", describe(&tok)),
                    off,
                ));
            }
            None => return Err(PragmaError::new("expected a variable name", offset)),
        }
        match stream.next() {
            Some((Tok::Comma, _)) => continue,
            Some((Tok::RParen, _)) => return Ok(()),
            Some((tok, off)) => {
                return Err(PragmaError::new(
                    format!("expected `,` or `)`, found {}", describe(&tok)),
                    off,
                ));
            }
            None => return Err(PragmaError::new("unterminated clause", stream.offset())),
        }
    }
}

fn parse_reduction(stream: &mut TokenStream, clauses: &mut Clauses) -> Result<(), PragmaError> {
    stream.expect(Tok::LParen, "`(`")?;
    let offset = stream.offset();
    let op = match stream.next() {
        Some((Tok::Plus, _)) => ReductionOp::Add,
        Some((Tok::Star, _)) => ReductionOp::Mul,
        Some((Tok::Minus, _)) => ReductionOp::Sub,
        Some((Tok::Amp, _)) => ReductionOp::BitAnd,
        Some((Tok::Pipe, _)) => ReductionOp::BitOr,
        Some((Tok::Caret, _)) => ReductionOp::BitXor,
        Some((Tok::AndAnd, _)) => ReductionOp::LogicalAnd,
        Some((Tok::OrOr, _)) => ReductionOp::LogicalOr,
        Some((tok, off)) => {
            return Err(PragmaError::new(
                format!("unknown reduction operator {}", describe(&tok)),
                off,
            ));
        }
        None => return Err(PragmaError::new("expected a reduction operator", offset)),
    };
    stream.expect(Tok::Colon, "`:`")?;
    loop {
        let offset = stream.offset();
        match stream.next() {
            Some((Tok::Ident(name), off)) => {
                if clauses.mentions(&name) {
                    return Err(PragmaError::new(
                        format!("name `{name}` already has a data-sharing attribute"),
                        off,
                    ));
                }
                clauses.reduction_vars.insert(name, op);
            }
            Some((tok, off)) => {
                return Err(PragmaError::new(
                    format!("expected a variable name, found {}", describe(&tok)),
                    off,
                ));
            }
            None => return Err(PragmaError::new("expected a variable name", offset)),
        }
        match stream.next() {
            Some((Tok::Comma, _)) => continue,
            Some((Tok::RParen, _)) => return Ok(()),
            Some((tok, off)) => {
                return Err(PragmaError::new(
                    format!("expected `,` or `)`, found {}", describe(&tok)),
                    off,
                ));
            }
            None => return Err(PragmaError::new("unterminated clause", stream.offset())),
        }
    }
}
