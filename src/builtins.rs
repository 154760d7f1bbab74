//! Built-in skills available to every VibeScript program

use rand::Rng;

use crate::environment::Environment;
use crate::value::{NativeFn, Value};

/// Every built-in, in registration order
pub fn natives() -> Vec<NativeFn> {
    vec![
        // size(array | string)
        NativeFn::new("size", 1, |args| match &args[0] {
            Value::Array(items) => Ok(Value::Number(items.borrow().len() as f64)),
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(format!(
                "size() expects an array or string, got {}",
                other.type_name()
            )),
        }),
        // push(array, value)
        NativeFn::new("push", 2, |args| match &args[0] {
            Value::Array(items) => {
                items.borrow_mut().push(args[1].clone());
                Ok(Value::Null)
            }
            other => Err(format!(
                "push() expects an array as first argument, got {}",
                other.type_name()
            )),
        }),
        // pop(array)
        NativeFn::new("pop", 1, |args| match &args[0] {
            Value::Array(items) => Ok(items.borrow_mut().pop().unwrap_or(Value::Null)),
            other => Err(format!("pop() expects an array, got {}", other.type_name())),
        }),
        // type(value)
        NativeFn::new("type", 1, |args| {
            Ok(Value::String(args[0].type_name().to_string()))
        }),
        // num(value)
        NativeFn::new("num", 1, |args| match &args[0] {
            Value::Number(n) => Ok(Value::Number(*n)),
            Value::String(s) => parse_number(s)
                .map(Value::Number)
                .ok_or_else(|| format!("cannot convert \"{}\" to number", s)),
            Value::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
            other => Err(format!("cannot convert {} to number", other.type_name())),
        }),
        // str(value)
        NativeFn::new("str", 1, |args| Ok(Value::String(args[0].to_string()))),
        NativeFn::new("abs", 1, |args| unary_math("abs", &args[0], f64::abs)),
        NativeFn::new("floor", 1, |args| unary_math("floor", &args[0], f64::floor)),
        NativeFn::new("ceil", 1, |args| unary_math("ceil", &args[0], f64::ceil)),
        NativeFn::new("round", 1, |args| unary_math("round", &args[0], round_half_up)),
        NativeFn::new("min", 2, |args| binary_math("min", args, f64::min)),
        NativeFn::new("max", 2, |args| binary_math("max", args, f64::max)),
        // random() in [0, 1)
        NativeFn::new("random", 0, |_args| {
            Ok(Value::Number(rand::thread_rng().gen::<f64>()))
        }),
    ]
}

/// Define every built-in in `env`
pub fn register(env: &mut Environment) {
    for native in natives() {
        let name = native.name;
        env.define(name, Value::NativeFunction(native), false);
    }
}

fn unary_math(name: &str, value: &Value, op: fn(f64) -> f64) -> Result<Value, String> {
    match value {
        Value::Number(n) => Ok(Value::Number(op(*n))),
        other => Err(format!("{}() expects a number, got {}", name, other.type_name())),
    }
}

fn binary_math(name: &str, args: &[Value], op: fn(f64, f64) -> f64) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op(*a, *b))),
        _ => Err(format!("{}() expects two numbers", name)),
    }
}

/// Nearest integer, halves towards positive infinity: round(-2.5) == -2
///
/// `(n + 0.5).floor()` would be off for values just below a half, where the
/// addition itself rounds up.
fn round_half_up(n: f64) -> f64 {
    let floor = n.floor();
    if n - floor == 0.5 {
        floor + 1.0
    } else {
        n.round()
    }
}

/// Parse user text as a finite decimal number
fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let looks_numeric = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !looks_numeric {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        let native = natives()
            .into_iter()
            .find(|n| n.name == name)
            .unwrap_or_else(|| panic!("no built-in named {}", name));
        assert_eq!(native.arity, args.len());
        native.call(args)
    }

    #[test]
    fn test_size() {
        assert_eq!(call("size", &[Value::from("héllo")]), Ok(Value::Number(5.0)));
        assert_eq!(
            call("size", &[Value::array(vec![Value::Null, Value::Null])]),
            Ok(Value::Number(2.0))
        );
        assert!(call("size", &[Value::Number(3.0)]).is_err());
    }

    #[test]
    fn test_push_and_pop_share_the_array() {
        let arr = Value::array(vec![Value::Number(1.0)]);
        call("push", &[arr.clone(), Value::Number(2.0)]).unwrap();
        assert_eq!(arr.to_string(), "[1, 2]");
        assert_eq!(call("pop", &[arr.clone()]), Ok(Value::Number(2.0)));
        assert_eq!(call("pop", &[arr.clone()]), Ok(Value::Number(1.0)));
        assert_eq!(call("pop", &[arr]), Ok(Value::Null));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("num", &[Value::from(" 12.5 ")]), Ok(Value::Number(12.5)));
        assert_eq!(call("num", &[Value::Bool(true)]), Ok(Value::Number(1.0)));
        assert!(call("num", &[Value::from("abc")]).is_err());
        assert!(call("num", &[Value::from("inf")]).is_err());
        assert_eq!(call("str", &[Value::Bool(false)]), Ok(Value::from("cap")));
        assert_eq!(call("type", &[Value::Null]), Ok(Value::from("null")));
    }

    #[test]
    fn test_math() {
        assert_eq!(call("abs", &[Value::Number(-3.0)]), Ok(Value::Number(3.0)));
        assert_eq!(call("floor", &[Value::Number(2.7)]), Ok(Value::Number(2.0)));
        assert_eq!(call("ceil", &[Value::Number(2.1)]), Ok(Value::Number(3.0)));
        assert_eq!(call("round", &[Value::Number(2.5)]), Ok(Value::Number(3.0)));
        assert_eq!(call("round", &[Value::Number(-2.5)]), Ok(Value::Number(-2.0)));
        assert_eq!(call("round", &[Value::Number(-2.6)]), Ok(Value::Number(-3.0)));
        assert_eq!(
            call("round", &[Value::Number(0.49999999999999994)]),
            Ok(Value::Number(0.0))
        );
        assert_eq!(
            call("round", &[Value::Number(4503599627370497.0)]),
            Ok(Value::Number(4503599627370497.0))
        );
        assert_eq!(
            call("min", &[Value::Number(4.0), Value::Number(-1.0)]),
            Ok(Value::Number(-1.0))
        );
        assert_eq!(
            call("max", &[Value::Number(4.0), Value::Number(-1.0)]),
            Ok(Value::Number(4.0))
        );
        assert!(call("max", &[Value::Number(4.0), Value::from("x")]).is_err());
    }

    #[test]
    fn test_random_range() {
        for _ in 0..100 {
            match call("random", &[]) {
                Ok(Value::Number(n)) => assert!((0.0..1.0).contains(&n)),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_register_defines_all() {
        let mut env = Environment::new();
        register(&mut env);
        for name in ["size", "push", "pop", "type", "num", "str", "abs", "floor", "ceil",
                     "round", "min", "max", "random"] {
            assert!(env.contains(name), "missing {}", name);
        }
    }
}
