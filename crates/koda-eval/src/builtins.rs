//! Builtin members of arrays, strings and numbers.
//!
//! Methods are returned as natives bound to their receiver, so
//! `xs.push(1)` and `const push = xs.push; push(1)` behave the same.

use std::cell::RefCell;
use std::rc::Rc;

use koda_types::ScriptError;

use crate::value::{format_number, Value};

/// Argument `i` as a number (missing → `NaN`).
pub fn number_arg(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(f64::NAN, Value::to_number)
}

/// Argument `i` as a string (missing → `"undefined"`).
pub fn string_arg(args: &[Value], i: usize) -> String {
    args.get(i)
        .map_or_else(|| "undefined".to_string(), Value::to_string)
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

/// Largest array the evaluator stores. Arrays are dense, so anything past
/// this raises `RangeError: Invalid array length` instead of allocating.
pub const MAX_ARRAY_LENGTH: usize = 1 << 22;

pub(crate) const INVALID_ARRAY_LENGTH: &str = "Invalid array length";

/// Canonical array index: `"3"` → 3, but not `"03"` or `"-1"`.
pub(crate) fn array_index(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|i| i.to_string() == key)
}

/// Relative index as used by `slice`: negative counts from the end.
fn relative_index(value: f64, len: usize, default: usize) -> usize {
    if value.is_nan() {
        return default;
    }
    let len_f = len as f64;
    let idx = if value < 0.0 {
        (len_f + value.trunc()).max(0.0)
    } else {
        value.trunc().min(len_f)
    };
    idx as usize
}

// ══════════════════════════════════════════════════════════════════════════════
// Arrays
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) fn array_member(items: &Rc<RefCell<Vec<Value>>>, key: &str) -> Value {
    if key == "length" {
        return Value::Number(items.borrow().len() as f64);
    }
    if let Some(i) = array_index(key) {
        return items.borrow().get(i).cloned().unwrap_or(Value::Undefined);
    }

    let items = Rc::clone(items);
    match key {
        "push" => Value::native("push", move |args| {
            let mut items = items.borrow_mut();
            if items.len() + args.len() > MAX_ARRAY_LENGTH {
                return Err(ScriptError::range(INVALID_ARRAY_LENGTH));
            }
            items.extend(args.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }),
        "pop" => Value::native("pop", move |_| {
            Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined))
        }),
        "indexOf" => Value::native("indexOf", move |args| {
            let needle = arg(args, 0);
            let found = items.borrow().iter().position(|v| v.strict_equals(&needle));
            Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
        }),
        "includes" => Value::native("includes", move |args| {
            let needle = arg(args, 0);
            // `includes` finds NaN, unlike `indexOf`
            Ok(Value::Bool(items.borrow().iter().any(|v| *v == needle)))
        }),
        "join" => Value::native("join", move |args| {
            let sep = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(v) => v.to_string(),
            };
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_string() })
                .collect();
            Ok(Value::String(parts.join(&sep)))
        }),
        "slice" => Value::native("slice", move |args| {
            let items = items.borrow();
            let len = items.len();
            let start = relative_index(number_arg(args, 0), len, 0);
            let end = match args.get(1) {
                None | Some(Value::Undefined) => len,
                Some(v) => relative_index(v.to_number(), len, len),
            };
            let slice = if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            };
            Ok(Value::array(slice))
        }),
        _ => Value::Undefined,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Strings
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) fn string_member(s: &str, key: &str) -> Value {
    let chars: Vec<char> = s.chars().collect();
    if key == "length" {
        return Value::Number(chars.len() as f64);
    }
    if let Some(i) = array_index(key) {
        return chars
            .get(i)
            .map_or(Value::Undefined, |c| Value::String(c.to_string()));
    }

    let s = s.to_string();
    match key {
        "toUpperCase" => Value::native("toUpperCase", move |_| Ok(Value::String(s.to_uppercase()))),
        "toLowerCase" => Value::native("toLowerCase", move |_| Ok(Value::String(s.to_lowercase()))),
        "trim" => Value::native("trim", move |_| Ok(Value::String(s.trim().to_string()))),
        "includes" => Value::native("includes", move |args| {
            Ok(Value::Bool(s.contains(string_arg(args, 0).as_str())))
        }),
        "indexOf" => Value::native("indexOf", move |args| {
            let needle = string_arg(args, 0);
            let found = s
                .find(needle.as_str())
                .map(|byte| s[..byte].chars().count() as f64);
            Ok(Value::Number(found.unwrap_or(-1.0)))
        }),
        "charAt" => Value::native("charAt", move |args| {
            let i = number_arg(args, 0);
            let i = if i.is_nan() { 0.0 } else { i.trunc() };
            let c = if i >= 0.0 { chars.get(i as usize) } else { None };
            Ok(Value::String(c.map(|c| c.to_string()).unwrap_or_default()))
        }),
        "slice" => Value::native("slice", move |args| {
            let len = chars.len();
            let start = relative_index(number_arg(args, 0), len, 0);
            let end = match args.get(1) {
                None | Some(Value::Undefined) => len,
                Some(v) => relative_index(v.to_number(), len, len),
            };
            let out: String = if start < end {
                chars[start..end].iter().collect()
            } else {
                String::new()
            };
            Ok(Value::String(out))
        }),
        "split" => Value::native("split", move |args| {
            let parts = match args.first() {
                None | Some(Value::Undefined) => vec![Value::String(s.clone())],
                Some(sep) => {
                    let sep = sep.to_string();
                    if sep.is_empty() {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                }
            };
            Ok(Value::array(parts))
        }),
        _ => Value::Undefined,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Numbers
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) fn number_member(n: f64, key: &str) -> Value {
    match key {
        "toFixed" => Value::native("toFixed", move |args| {
            let digits = match args.first() {
                None | Some(Value::Undefined) => 0.0,
                Some(v) => v.to_number().trunc(),
            };
            if !(0.0..=100.0).contains(&digits) {
                return Err(ScriptError::range(
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            if !n.is_finite() {
                return Ok(Value::String(format_number(n)));
            }
            Ok(Value::String(format!("{:.*}", digits as usize, n)))
        }),
        "toString" => Value::native("toString", move |_| Ok(Value::String(format_number(n)))),
        _ => Value::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(method: Value, args: &[Value]) -> Value {
        match method {
            Value::Function(crate::value::Function::Native(native)) => {
                (native.func)(args).expect("native call")
            }
            other => panic!("not a native: {other:?}"),
        }
    }

    #[test]
    fn test_array_index_is_canonical() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
    }

    #[test]
    fn test_push_and_pop_share_the_receiver() {
        let items = Rc::new(RefCell::new(vec![Value::from(1.0)]));
        let len = call(array_member(&items, "push"), &[2.0.into(), 3.0.into()]);
        assert_eq!(len, Value::from(3.0));
        assert_eq!(call(array_member(&items, "pop"), &[]), Value::from(3.0));
        assert_eq!(array_member(&items, "length"), Value::from(2.0));
    }

    #[test]
    fn test_join_and_slice() {
        let items = Rc::new(RefCell::new(vec![1.0.into(), Value::Null, "b".into()]));
        assert_eq!(call(array_member(&items, "join"), &[]), Value::from("1,,b"));
        assert_eq!(call(array_member(&items, "join"), &["-".into()]), Value::from("1--b"));
        let tail = call(array_member(&items, "slice"), &[(-2.0).into()]);
        assert_eq!(tail.inspect(), "[null, 'b']");
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(call(string_member("Hej", "toUpperCase"), &[]), Value::from("HEJ"));
        assert_eq!(call(string_member("röd boll", "indexOf"), &["boll".into()]), Value::from(4.0));
        assert_eq!(string_member("åäö", "length"), Value::from(3.0));
        assert_eq!(string_member("abc", "1"), Value::from("b"));
        assert_eq!(
            call(string_member("a,b", "split"), &[",".into()]).inspect(),
            "['a', 'b']"
        );
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(call(number_member(3.14159, "toFixed"), &[2.0.into()]), Value::from("3.14"));
        assert_eq!(call(number_member(2.75, "toFixed"), &[]), Value::from("3"));
    }

    #[test]
    fn test_arg_coercion() {
        assert!(number_arg(&[], 0).is_nan());
        assert_eq!(string_arg(&[], 1), "undefined");
        assert_eq!(number_arg(&["12".into()], 0), 12.0);
    }
}
