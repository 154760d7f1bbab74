//! Error types for VibeScript
//!
//! One error type covers all three phases (lexing, parsing, running);
//! the kind decides which phase it belongs to.

use crate::token::Span;
use std::fmt;

/// The phase an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lex,
    Parse,
    Runtime,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lex => write!(f, "LexError"),
            Phase::Parse => write!(f, "ParseError"),
            Phase::Runtime => write!(f, "RuntimeError"),
        }
    }
}

/// Error kinds in VibeScript
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    // Lexer errors
    UnexpectedCharacter(char),
    UnterminatedString,
    InvalidNumber(String),

    // Parser errors
    ExpectedToken(String, String),
    ExpectedExpression(String),
    InvalidAssignmentTarget,
    TooManyItems(&'static str),
    NestingTooDeep(usize),

    // Runtime errors
    UndefinedVariable(String),
    ConstantReassignment(String),
    CannotAdd(&'static str, &'static str),
    OperandNotNumber(String),
    DivisionByZero,
    NotCallable(&'static str),
    WrongArity(usize, usize),
    CannotIterate(&'static str),
    CannotIndex(&'static str),
    IndexNotNumber(&'static str),
    RangeBoundsNotNumbers,
    PossibleInfiniteLoop,
    StackOverflow,
    StopOutsideLoop,
    SkipOutsideLoop,
    GiveOutsideSkill,

    // Failure reported by a built-in
    Native(String),
}

impl ErrorKind {
    pub fn phase(&self) -> Phase {
        match self {
            ErrorKind::UnexpectedCharacter(_)
            | ErrorKind::UnterminatedString
            | ErrorKind::InvalidNumber(_) => Phase::Lex,
            ErrorKind::ExpectedToken(..)
            | ErrorKind::ExpectedExpression(_)
            | ErrorKind::InvalidAssignmentTarget
            | ErrorKind::TooManyItems(_)
            | ErrorKind::NestingTooDeep(_) => Phase::Parse,
            _ => Phase::Runtime,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            ErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ErrorKind::InvalidNumber(s) => write!(f, "invalid number '{}'", s),
            ErrorKind::ExpectedToken(expected, got) => {
                write!(f, "{}, got '{}'", expected, got)
            }
            ErrorKind::ExpectedExpression(got) => write!(f, "expected expression, got '{}'", got),
            ErrorKind::InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            ErrorKind::TooManyItems(what) => write!(f, "can't have more than 255 {}", what),
            ErrorKind::NestingTooDeep(limit) => {
                write!(f, "nesting too deep, more than {} levels", limit)
            }
            ErrorKind::UndefinedVariable(name) => write!(f, "undefined variable '{}'", name),
            ErrorKind::ConstantReassignment(name) => {
                write!(f, "cannot reassign constant '{}', it's locked", name)
            }
            ErrorKind::CannotAdd(a, b) => write!(f, "cannot add {} and {}", a, b),
            ErrorKind::OperandNotNumber(op) => {
                write!(f, "operand must be a number for '{}'", op)
            }
            ErrorKind::DivisionByZero => write!(f, "division by zero"),
            ErrorKind::NotCallable(type_name) => {
                write!(f, "{} is not callable, only skills can be called", type_name)
            }
            ErrorKind::WrongArity(expected, got) => write!(
                f,
                "wrong arity: expected {} argument{} but got {}",
                expected,
                if *expected == 1 { "" } else { "s" },
                got
            ),
            ErrorKind::CannotIterate(type_name) => write!(f, "cannot iterate over {}", type_name),
            ErrorKind::CannotIndex(type_name) => write!(f, "cannot index {}", type_name),
            ErrorKind::IndexNotNumber(type_name) => {
                write!(f, "index must be a number, got {}", type_name)
            }
            ErrorKind::RangeBoundsNotNumbers => write!(f, "range bounds must be numbers"),
            ErrorKind::PossibleInfiniteLoop => {
                write!(f, "possible infinite loop detected, too many operations")
            }
            ErrorKind::StackOverflow => write!(f, "stack overflow"),
            ErrorKind::StopOutsideLoop => write!(f, "'stop' outside of loop"),
            ErrorKind::SkipOutsideLoop => write!(f, "'skip' outside of loop"),
            ErrorKind::GiveOutsideSkill => write!(f, "'give' outside of skill"),
            ErrorKind::Native(msg) => write!(f, "{}", msg),
        }
    }
}

/// A VibeScript error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct VibeError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub source_line: Option<String>,
}

impl VibeError {
    pub fn new(kind: ErrorKind, span: Option<Span>) -> Self {
        Self {
            kind,
            span,
            source_line: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.kind.phase()
    }

    /// Attach a location if the error doesn't carry one yet
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        if let Some(span) = &self.span {
            if span.line > 0 {
                self.source_line = source.lines().nth(span.line - 1).map(str::to_string);
            }
        }
        self
    }
}

impl fmt::Display for VibeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = &self.span {
            write!(
                f,
                "[line {}:{}] {}: {}",
                span.line,
                span.column,
                self.phase(),
                self.kind
            )?;

            if let Some(ref line) = self.source_line {
                write!(f, "\n  | {}", line)?;
                write!(f, "\n  | {}^", " ".repeat(span.column.saturating_sub(1)))?;
            }
        } else {
            write!(f, "{}: {}", self.phase(), self.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for VibeError {}

/// Result type for VibeScript operations
pub type Result<T> = std::result::Result<T, VibeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_span() {
        let err = VibeError::new(
            ErrorKind::UndefinedVariable("nope".to_string()),
            Some(Span::new(4, 8, 1, 5)),
        );
        assert_eq!(err.to_string(), "[line 1:5] RuntimeError: undefined variable 'nope'");
    }

    #[test]
    fn test_display_with_source_excerpt() {
        let err = VibeError::new(ErrorKind::UnexpectedCharacter('@'), Some(Span::new(9, 10, 2, 3)))
            .with_source("hold x = 1\nx @ 2");
        assert_eq!(
            err.to_string(),
            "[line 2:3] LexError: unexpected character '@'\n  | x @ 2\n  |   ^"
        );
    }

    #[test]
    fn test_or_span_keeps_existing_location() {
        let err = VibeError::new(ErrorKind::DivisionByZero, Some(Span::new(0, 1, 3, 7)))
            .or_span(Span::new(0, 1, 9, 9));
        assert_eq!(err.span.map(|s| s.line), Some(3));

        let err = VibeError::new(ErrorKind::DivisionByZero, None).or_span(Span::new(0, 1, 9, 2));
        assert_eq!(err.span.map(|s| s.column), Some(2));
    }

    #[test]
    fn test_phases() {
        assert_eq!(ErrorKind::UnterminatedString.phase(), Phase::Lex);
        assert_eq!(ErrorKind::InvalidAssignmentTarget.phase(), Phase::Parse);
        assert_eq!(ErrorKind::WrongArity(1, 2).phase(), Phase::Runtime);
    }
}
