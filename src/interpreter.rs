//! Tree-walking interpreter for VibeScript
//!
//! Statements produce a [`Flow`] that tells the enclosing construct whether
//! to keep going, leave a loop, or leave a skill. Errors travel separately
//! through `Result`, so `try`/`caught` can only ever see real failures.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::ast::{BinaryOp, EachSource, Expr, Literal, LogicalOp, Program, Stmt, UnaryOp};
use crate::builtins;
use crate::environment::{EnvRef, Environment};
use crate::error::{ErrorKind, Result, VibeError};
use crate::io::{InputProvider, OutputSink, StdIo};
use crate::stack::ensure_sufficient_stack;
use crate::token::Span;
use crate::value::{Skill, Value};

/// Operations allowed before the runaway guard looks at the clock
pub const MAX_OPERATIONS: u64 = 100_000;

/// Hitting `MAX_OPERATIONS` faster than this counts as an infinite loop
pub const RUNAWAY_WINDOW: Duration = Duration::from_secs(2);

/// Maximum nesting of skill calls
pub const MAX_CALL_DEPTH: usize = 2_000;

/// Execution limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_operations: u64,
    pub runaway_window: Duration,
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_operations: MAX_OPERATIONS,
            runaway_window: RUNAWAY_WINDOW,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

/// How a statement finished
#[derive(Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Counts operations and trips when too many happen too quickly
struct RunawayGuard {
    max_operations: u64,
    window: Duration,
    count: u64,
    started: Instant,
}

impl RunawayGuard {
    fn new(limits: &Limits) -> Self {
        Self {
            max_operations: limits.max_operations,
            window: limits.runaway_window,
            count: 0,
            started: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.started = Instant::now();
    }

    fn tick(&mut self) -> Result<()> {
        self.count += 1;
        if self.count > self.max_operations {
            // stays tripped until the window has passed
            if self.started.elapsed() < self.window {
                return Err(VibeError::new(ErrorKind::PossibleInfiniteLoop, None));
            }
            tracing::trace!(operations = self.count, "runaway guard window reset");
            self.reset();
        }
        Ok(())
    }
}

/// The interpreter
pub struct Interpreter {
    globals: EnvRef,
    env: EnvRef,
    output: Vec<String>,
    input: Box<dyn InputProvider>,
    sink: Box<dyn OutputSink>,
    limits: Limits,
    guard: RunawayGuard,
    depth: usize,
}

impl Interpreter {
    /// An interpreter wired to the console
    pub fn new() -> Self {
        Self::with_io(StdIo, StdIo)
    }

    /// An interpreter with injected input and output
    pub fn with_io(
        input: impl InputProvider + 'static,
        sink: impl OutputSink + 'static,
    ) -> Self {
        let globals = Environment::new_ref();
        builtins::register(&mut globals.borrow_mut());

        let limits = Limits::default();
        Self {
            env: Rc::clone(&globals),
            globals,
            output: Vec::new(),
            input: Box::new(input),
            sink: Box::new(sink),
            guard: RunawayGuard::new(&limits),
            limits,
            depth: 0,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.guard = RunawayGuard::new(&limits);
        self.limits = limits;
        self
    }

    /// The root scope, holding built-ins and top-level definitions
    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Lines printed by the most recent run
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Run a program, turning the first uncaught error into a final output line
    pub fn interpret(&mut self, program: &Program) -> Vec<String> {
        if let Err(err) = self.run(program) {
            self.output.push(err.to_string());
        }
        std::mem::take(&mut self.output)
    }

    /// Run a program, stopping at the first uncaught error
    ///
    /// Output printed before the error stays available through [`Self::output`].
    pub fn run(&mut self, program: &Program) -> Result<()> {
        self.output.clear();
        self.guard.reset();
        self.depth = 0;
        self.env = Rc::clone(&self.globals);

        tracing::debug!(statements = program.statements.len(), "run started");
        let started = Instant::now();

        for stmt in &program.statements {
            let result = self.execute(stmt).and_then(|flow| match flow {
                Flow::Normal => Ok(()),
                Flow::Break => Err(VibeError::new(ErrorKind::StopOutsideLoop, Some(stmt.span()))),
                Flow::Continue => Err(VibeError::new(ErrorKind::SkipOutsideLoop, Some(stmt.span()))),
                Flow::Return(_) => Err(VibeError::new(ErrorKind::GiveOutsideSkill, Some(stmt.span()))),
            });

            if let Err(err) = result {
                tracing::debug!(error = %err, "run aborted");
                return Err(err);
            }
        }

        tracing::debug!(
            lines = self.output.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        Ok(())
    }

    // ==================== Statements ====================

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        self.guard.tick().map_err(|e| e.or_span(stmt.span()))?;

        match stmt {
            Stmt::Expr { expr } => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Say { value, .. } => {
                let line = self.evaluate(value)?.to_string();
                self.sink.print(&line);
                self.output.push(line);
                Ok(Flow::Normal)
            }

            Stmt::Hold { name, value, .. } => {
                let value = self.evaluate(value)?;
                self.env.borrow_mut().define(name.clone(), value, false);
                Ok(Flow::Normal)
            }

            Stmt::Lock { name, value, .. } => {
                let value = self.evaluate(value)?;
                self.env.borrow_mut().define(name.clone(), value, true);
                Ok(Flow::Normal)
            }

            Stmt::Block { stmts, .. } => {
                let scope = Environment::child_of(&self.env);
                self.execute_block(stmts, scope)
            }

            Stmt::If { condition, then_branch, else_branch, .. } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::Keep { condition, body, .. } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Each { var, source, body, span } => self.execute_each(var, source, body, *span),

            Stmt::Skill(decl) => {
                let skill = Skill::new(Rc::clone(decl), Rc::clone(&self.env));
                self.env
                    .borrow_mut()
                    .define(decl.name.clone(), Value::Skill(Rc::new(skill)), false);
                Ok(Flow::Normal)
            }

            Stmt::Give { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Stop { .. } => Ok(Flow::Break),

            Stmt::Skip { .. } => Ok(Flow::Continue),

            Stmt::Try { body, error_var, handler, .. } => {
                let scope = Environment::child_of(&self.env);
                match self.execute_block(body, scope) {
                    Ok(flow) => Ok(flow),
                    Err(err) => {
                        tracing::debug!(error = %err, "error caught");
                        let scope = Environment::child_of(&self.env);
                        if let Some(name) = error_var {
                            scope.borrow_mut().define(
                                name.clone(),
                                Value::String(err.kind.to_string()),
                                false,
                            );
                        }
                        self.execute_block(handler, scope)
                    }
                }
            }
        }
    }

    /// Run statements with `env` as the current scope, restoring the previous
    /// scope on every exit path
    fn execute_block(&mut self, stmts: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.env, env);
        let result = self.execute_all(stmts);
        self.env = previous;
        result
    }

    fn execute_all(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_each(&mut self, var: &str, source: &EachSource, body: &Stmt, span: Span) -> Result<Flow> {
        // one scope for the whole loop; the variable is rebound each iteration
        let loop_env = Environment::child_of(&self.env);

        match source {
            EachSource::Range { start, end } => {
                let (start, end) = match (self.evaluate(start)?, self.evaluate(end)?) {
                    (Value::Number(a), Value::Number(b)) => (a, b),
                    _ => return Err(VibeError::new(ErrorKind::RangeBoundsNotNumbers, Some(span))),
                };

                let mut i = start;
                while i <= end {
                    match self.iterate(&loop_env, var, Value::Number(i), body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    i += 1.0;
                }
            }
            EachSource::Collection(iterable) => {
                let items: Vec<Value> = match self.evaluate(iterable)? {
                    Value::Array(items) => items.borrow().clone(),
                    Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
                    other => {
                        return Err(VibeError::new(
                            ErrorKind::CannotIterate(other.type_name()),
                            Some(span),
                        ))
                    }
                };

                for item in items {
                    match self.iterate(&loop_env, var, item, body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
        }

        Ok(Flow::Normal)
    }

    fn iterate(&mut self, loop_env: &EnvRef, var: &str, item: Value, body: &Stmt) -> Result<Flow> {
        loop_env.borrow_mut().define(var, item, false);
        self.execute_block(std::slice::from_ref(body), Rc::clone(loop_env))
    }

    // ==================== Expressions ====================

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        self.guard.tick().map_err(|e| e.or_span(expr.span()))?;

        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),

            Expr::Ident { name, span } => {
                self.env.borrow().get(name).map_err(|e| e.or_span(*span))
            }

            Expr::Assign { name, value, span } => {
                let value = self.evaluate(value)?;
                self.env
                    .borrow_mut()
                    .assign(name, value.clone())
                    .map_err(|e| e.or_span(*span))?;
                Ok(value)
            }

            Expr::Binary { left, op, right, span } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(*op, left, right).map_err(|e| e.or_span(*span))
            }

            Expr::Unary { op, operand, span } => {
                let operand = self.evaluate(operand)?;
                match op {
                    UnaryOp::Neg => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(VibeError::new(
                            ErrorKind::OperandNotNumber("-".to_string()),
                            Some(*span),
                        )),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                }
            }

            Expr::Logical { left, op, right, .. } => {
                let left = self.evaluate(left)?;
                let decided = match op {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Grouping { expr, .. } => self.evaluate(expr),

            Expr::Call { callee, args, span } => {
                let callee = self.evaluate(callee)?;
                let Some(arity) = callee.arity() else {
                    return Err(VibeError::new(
                        ErrorKind::NotCallable(callee.type_name()),
                        Some(*span),
                    ));
                };

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }

                if values.len() != arity {
                    return Err(VibeError::new(
                        ErrorKind::WrongArity(arity, values.len()),
                        Some(*span),
                    ));
                }

                self.call(&callee, values).map_err(|e| e.or_span(*span))
            }

            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Value::array(values))
            }

            Expr::Index { object, index, span } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                index_value(&object, &index).map_err(|e| e.or_span(*span))
            }

            Expr::Ask { prompt, .. } => {
                let message = self.evaluate(prompt)?.to_string();
                let answer = self.input.prompt(&message).unwrap_or_default();
                Ok(Value::String(answer))
            }
        }
    }

    fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::NativeFunction(native) => {
                tracing::trace!(name = native.name, "calling built-in");
                native
                    .call(&args)
                    .map_err(|msg| VibeError::new(ErrorKind::Native(msg), None))
            }
            Value::Skill(skill) => self.call_skill(skill, args),
            other => Err(VibeError::new(ErrorKind::NotCallable(other.type_name()), None)),
        }
    }

    fn call_skill(&mut self, skill: &Rc<Skill>, args: Vec<Value>) -> Result<Value> {
        if self.depth >= self.limits.max_call_depth {
            return Err(VibeError::new(ErrorKind::StackOverflow, None));
        }
        tracing::trace!(name = skill.name(), depth = self.depth, "calling skill");

        // parented at the closure, not the caller: lexical scoping
        let scope = Environment::child_of(&skill.closure);
        {
            let mut scope = scope.borrow_mut();
            for (param, arg) in skill.declaration.params.iter().zip(args) {
                scope.define(param.clone(), arg, false);
            }
        }

        self.depth += 1;
        let result = self.execute_block(&skill.declaration.body, scope);
        self.depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
            Flow::Break => Err(VibeError::new(ErrorKind::StopOutsideLoop, None)),
            Flow::Continue => Err(VibeError::new(ErrorKind::SkipOutsideLoop, None)),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => Err(VibeError::new(
                ErrorKind::CannotAdd(left.type_name(), right.type_name()),
                None,
            )),
        },
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        _ => {
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(VibeError::new(ErrorKind::OperandNotNumber(op.to_string()), None));
            };
            let (a, b) = (*a, *b);

            Ok(match op {
                BinaryOp::Sub => Value::Number(a - b),
                BinaryOp::Mul => Value::Number(a * b),
                BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
                    return Err(VibeError::new(ErrorKind::DivisionByZero, None));
                }
                BinaryOp::Div => Value::Number(a / b),
                BinaryOp::Mod => Value::Number(a % b),
                BinaryOp::Lt => Value::Bool(a < b),
                BinaryOp::Le => Value::Bool(a <= b),
                BinaryOp::Gt => Value::Bool(a > b),
                BinaryOp::Ge => Value::Bool(a >= b),
                BinaryOp::Add | BinaryOp::Eq | BinaryOp::Ne => unreachable!("handled above"),
            })
        }
    }
}

fn index_value(object: &Value, index: &Value) -> Result<Value> {
    let position = |index: &Value| match index {
        Value::Number(n) => {
            let n = n.floor();
            Ok((n >= 0.0).then_some(n as usize))
        }
        other => Err(VibeError::new(ErrorKind::IndexNotNumber(other.type_name()), None)),
    };

    match object {
        Value::Array(items) => {
            let item = position(index)?.and_then(|i| items.borrow().get(i).cloned());
            Ok(item.unwrap_or(Value::Null))
        }
        Value::String(s) => {
            let ch = position(index)?.and_then(|i| s.chars().nth(i));
            Ok(ch.map_or(Value::Null, |c| Value::String(c.to_string())))
        }
        other => Err(VibeError::new(ErrorKind::CannotIndex(other.type_name()), None)),
    }
}
