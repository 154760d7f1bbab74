//! Abstract Syntax Tree definitions for VibeScript
//!
//! Represents the structure of programs after parsing. Traversals match on
//! these enums directly; there is no per-node dispatch method.

use std::rc::Rc;

use crate::token::Span;

pub use crate::token::Literal;

/// Expression nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal: 42, "hi", bet, cap, null
    Literal { value: Literal, span: Span },

    /// Variable reference: foo
    Ident { name: String, span: Span },

    /// Binary operation: a + b, x * y
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },

    /// Unary operation: -x, not y
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// Logical and/or: a and b, x or y
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
        span: Span,
    },

    /// Grouping: (expr)
    Grouping { expr: Box<Expr>, span: Span },

    /// Function call: foo(a, b)
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// Array literal: [1, 2, 3]
    Array { elements: Vec<Expr>, span: Span },

    /// Index: xs[0]
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// Assignment: x = expr
    Assign {
        name: String,
        value: Box<Expr>,
        span: Span,
    },

    /// Input prompt: ask "name?"
    Ask { prompt: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Grouping { span, .. }
            | Expr::Call { span, .. }
            | Expr::Array { span, .. }
            | Expr::Index { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Ask { span, .. } => *span,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    Mod,      // %
    Eq,       // ==
    Ne,       // !=
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::Ne => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,  // -
    Not,  // not, !
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
}

/// The two shapes of an `each` loop
#[derive(Debug, Clone, PartialEq)]
pub enum EachSource {
    /// each (i from start to end)
    Range { start: Expr, end: Expr },
    /// each (item in collection)
    Collection(Expr),
}

/// A skill declaration, shared with the skill values created from it
#[derive(Debug, Clone, PartialEq)]
pub struct SkillDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Statement nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Expression statement
    Expr { expr: Expr },

    /// Print: say expr
    Say { value: Expr, span: Span },

    /// Mutable binding: hold x = expr
    Hold {
        name: String,
        value: Expr,
        span: Span,
    },

    /// Constant binding: lock x = expr
    Lock {
        name: String,
        value: Expr,
        span: Span,
    },

    /// Block: { stmt* }
    Block { stmts: Vec<Stmt>, span: Span },

    /// If statement: if (cond) stmt else stmt
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },

    /// While loop: keep (cond) stmt
    Keep {
        condition: Expr,
        body: Box<Stmt>,
        span: Span,
    },

    /// For loop: each (i from a to b) stmt / each (x in xs) stmt
    Each {
        var: String,
        source: EachSource,
        body: Box<Stmt>,
        span: Span,
    },

    /// Function definition: skill name(params) { }
    Skill(Rc<SkillDecl>),

    /// Return: give expr
    Give { value: Option<Expr>, span: Span },

    /// Break
    Stop { span: Span },

    /// Continue
    Skip { span: Span },

    /// try { } caught (err) { }
    Try {
        body: Vec<Stmt>,
        error_var: Option<String>,
        handler: Vec<Stmt>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr { expr } => expr.span(),
            Stmt::Skill(decl) => decl.span,
            Stmt::Say { span, .. }
            | Stmt::Hold { span, .. }
            | Stmt::Lock { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Keep { span, .. }
            | Stmt::Each { span, .. }
            | Stmt::Give { span, .. }
            | Stmt::Stop { span }
            | Stmt::Skip { span }
            | Stmt::Try { span, .. } => *span,
        }
    }
}

/// A complete program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}
