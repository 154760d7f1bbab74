//! Runtime value types for VibeScript

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::SkillDecl;
use crate::environment::EnvRef;
use crate::stack::ensure_sufficient_stack;

/// Arrays are shared by reference: aliases observe each other's mutations
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Runtime values in VibeScript
#[derive(Clone)]
pub enum Value {
    /// Numeric value
    Number(f64),

    /// String value
    String(String),

    /// Boolean value (`bet` / `cap`)
    Bool(bool),

    /// Null value
    Null,

    /// Array/list
    Array(ArrayRef),

    /// User-defined function
    Skill(Rc<Skill>),

    /// Built-in function
    NativeFunction(NativeFn),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Skill(_) | Value::NativeFunction(_) => "skill",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Skill(_) | Value::NativeFunction(_) => true,
        }
    }

    /// Number of parameters a callable value expects
    pub fn arity(&self) -> Option<usize> {
        match self {
            Value::Skill(skill) => Some(skill.arity()),
            Value::NativeFunction(native) => Some(native.arity),
            _ => None,
        }
    }
}

/// Format a number the way the language prints it
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        // covers -0
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

/// Write a value; `open` holds the arrays currently being printed so a
/// self-containing array prints as `[...]` instead of recursing forever
fn write_value(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    open: &mut Vec<*const RefCell<Vec<Value>>>,
) -> fmt::Result {
    match value {
        Value::Number(n) => write!(f, "{}", format_number(*n)),
        Value::String(s) => write!(f, "{}", s),
        Value::Bool(true) => write!(f, "bet"),
        Value::Bool(false) => write!(f, "cap"),
        Value::Null => write!(f, "null"),
        Value::Array(items) => {
            let ptr = Rc::as_ptr(items);
            if open.contains(&ptr) {
                return write!(f, "[...]");
            }

            open.push(ptr);
            let result = ensure_sufficient_stack(|| {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_value(f, item, open)?;
                }
                write!(f, "]")
            });
            open.pop();
            result
        }
        Value::Skill(skill) => write!(f, "<skill {}>", skill.name()),
        Value::NativeFunction(nf) => write!(f, "<native skill {}>", nf.name),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other, &mut Vec::new())
    }
}

type ArrayPair = (*const RefCell<Vec<Value>>, *const RefCell<Vec<Value>>);

/// Structural equality; a pair of arrays already being compared further up
/// counts as equal, which keeps cyclic arrays from recursing forever
fn values_equal(a: &Value, b: &Value, open: &mut Vec<ArrayPair>) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Array(a), Value::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
            if open.contains(&pair) {
                return true;
            }

            open.push(pair);
            let equal = ensure_sufficient_stack(|| {
                let (a, b) = (a.borrow(), b.borrow());
                let same = a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y, open));
                same
            });
            open.pop();
            equal
        }
        (Value::Skill(a), Value::Skill(b)) => Rc::ptr_eq(a, b),
        (Value::NativeFunction(a), Value::NativeFunction(b)) => a.name == b.name,
        _ => false,
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// User-defined function: its declaration plus the scope it was defined in
pub struct Skill {
    pub declaration: Rc<SkillDecl>,
    pub closure: EnvRef,
}

impl Skill {
    pub fn new(declaration: Rc<SkillDecl>, closure: EnvRef) -> Self {
        Self { declaration, closure }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

/// Native function type
pub type NativeFnPtr = fn(&[Value]) -> Result<Value, String>;

/// Native/built-in function
#[derive(Clone)]
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFnPtr,
}

impl NativeFn {
    pub fn new(name: &'static str, arity: usize, func: NativeFnPtr) -> Self {
        Self { name, arity, func }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native skill {}>", self.name)
    }
}
