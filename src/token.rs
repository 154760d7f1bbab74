//! Token definitions for VibeScript
//!
//! Tokens represent the atomic units of meaning in source code.

use std::fmt;

/// Location in source code for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }
}

/// A literal value carried by a token or an AST literal node
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

/// Token types in VibeScript
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(String),
    True,       // bet
    False,      // cap
    Null,

    // Identifiers
    Ident(String),

    // Keywords
    Hold,       // mutable binding
    Lock,       // constant binding
    Say,        // print
    Ask,        // read input
    If,
    Else,
    Keep,       // while loop
    Each,       // for loop
    From,       // each (i from a to b)
    To,
    In,         // each (x in xs)
    Skill,      // function definition
    Give,       // return
    Stop,       // break
    Skip,       // continue
    Try,
    Caught,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %

    // Comparison
    Equal,      // =
    EqualEqual, // ==
    BangEqual,  // !=
    Less,       // <
    LessEqual,  // <=
    Greater,    // >
    GreaterEqual, // >=

    // Logical
    And,        // and
    Or,         // or
    Not,        // not, !

    // Delimiters
    LeftParen,  // (
    RightParen, // )
    LeftBrace,  // {
    RightBrace, // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,      // ,
    Semicolon,  // ;

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::True => write!(f, "bet"),
            TokenKind::False => write!(f, "cap"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Hold => write!(f, "hold"),
            TokenKind::Lock => write!(f, "lock"),
            TokenKind::Say => write!(f, "say"),
            TokenKind::Ask => write!(f, "ask"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Keep => write!(f, "keep"),
            TokenKind::Each => write!(f, "each"),
            TokenKind::From => write!(f, "from"),
            TokenKind::To => write!(f, "to"),
            TokenKind::In => write!(f, "in"),
            TokenKind::Skill => write!(f, "skill"),
            TokenKind::Give => write!(f, "give"),
            TokenKind::Stop => write!(f, "stop"),
            TokenKind::Skip => write!(f, "skip"),
            TokenKind::Try => write!(f, "try"),
            TokenKind::Caught => write!(f, "caught"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Equal => write!(f, "="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::And => write!(f, "and"),
            TokenKind::Or => write!(f, "or"),
            TokenKind::Not => write!(f, "not"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its kind and location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, lexeme: String) -> Self {
        Self { kind, span, lexeme }
    }

    /// The literal value this token denotes, if any
    pub fn literal(&self) -> Option<Literal> {
        match &self.kind {
            TokenKind::Number(n) => Some(Literal::Number(*n)),
            TokenKind::String(s) => Some(Literal::String(s.clone())),
            TokenKind::True => Some(Literal::Bool(true)),
            TokenKind::False => Some(Literal::Bool(false)),
            TokenKind::Null => Some(Literal::Null),
            _ => None,
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = format!("{:?}", self.kind);
        write!(f, "{:>4}:{:<4} {:<20} {}", self.span.line, self.span.column, kind, self.lexeme)
    }
}

/// Check if a string is a keyword and return the corresponding token kind
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    match ident {
        "hold" => Some(TokenKind::Hold),
        "lock" => Some(TokenKind::Lock),
        "say" => Some(TokenKind::Say),
        "ask" => Some(TokenKind::Ask),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "keep" => Some(TokenKind::Keep),
        "each" => Some(TokenKind::Each),
        "from" => Some(TokenKind::From),
        "to" => Some(TokenKind::To),
        "in" => Some(TokenKind::In),
        "skill" => Some(TokenKind::Skill),
        "give" => Some(TokenKind::Give),
        "stop" => Some(TokenKind::Stop),
        "skip" => Some(TokenKind::Skip),
        "bet" => Some(TokenKind::True),
        "cap" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "and" => Some(TokenKind::And),
        "or" => Some(TokenKind::Or),
        "not" => Some(TokenKind::Not),
        "try" => Some(TokenKind::Try),
        "caught" => Some(TokenKind::Caught),
        _ => None,
    }
}

/// Whether a token of this kind can only appear at the start of a statement
pub fn starts_statement(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Skill
            | TokenKind::Hold
            | TokenKind::Lock
            | TokenKind::If
            | TokenKind::Keep
            | TokenKind::Each
            | TokenKind::Say
            | TokenKind::Give
            | TokenKind::Stop
            | TokenKind::Skip
            | TokenKind::Try
    )
}
