//! The `Math` geometry object.

use std::f64::consts;

use koda_eval::{number_arg, Value};
use koda_types::{ErrorKind, ScriptError};

/// Build the `Math` object.
pub fn math_object() -> Value {
    let mut fields: Vec<(String, Value)> = vec![
        ("PI".to_string(), Value::Number(consts::PI)),
        ("E".to_string(), Value::Number(consts::E)),
    ];

    let unary: [(&str, fn(f64) -> f64); 13] = [
        ("abs", f64::abs),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("round", round),
        ("trunc", f64::trunc),
        ("sign", sign),
        ("sqrt", f64::sqrt),
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("log", f64::ln),
        ("exp", f64::exp),
        ("cbrt", f64::cbrt),
    ];
    for (name, op) in unary {
        let func = Value::native(name, move |args| Ok(Value::Number(op(number_arg(args, 0)))));
        fields.push((name.to_string(), func));
    }

    let binary: [(&str, fn(f64, f64) -> f64); 2] = [("pow", pow), ("atan2", f64::atan2)];
    for (name, op) in binary {
        let func = Value::native(name, move |args| {
            Ok(Value::Number(op(number_arg(args, 0), number_arg(args, 1))))
        });
        fields.push((name.to_string(), func));
    }

    fields.push((
        "min".to_string(),
        Value::native("min", |args| Ok(Value::Number(fold(args, f64::INFINITY, f64::min)))),
    ));
    fields.push((
        "max".to_string(),
        Value::native("max", |args| {
            Ok(Value::Number(fold(args, f64::NEG_INFINITY, f64::max)))
        }),
    ));
    fields.push((
        "hypot".to_string(),
        Value::native("hypot", |args| {
            let sum: f64 = args.iter().map(|v| v.to_number().powi(2)).sum();
            Ok(Value::Number(sum.sqrt()))
        }),
    ));
    fields.push((
        "random".to_string(),
        Value::native("random", |_| random().map(Value::Number)),
    ));

    Value::object(fields)
}

/// Round half up, so `-2.5` rounds to `-2`.
fn round(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    (x + 0.5).floor()
}

fn sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 {
        x
    } else {
        x.signum()
    }
}

fn pow(base: f64, exponent: f64) -> f64 {
    // `1 ** NaN` is NaN for scripts
    if exponent.is_nan() {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// `min`/`max` over the arguments; any NaN poisons the result.
fn fold(args: &[Value], init: f64, op: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = op(acc, n);
    }
    acc
}

/// Uniform in `[0, 1)` from 53 random bits.
fn random() -> Result<f64, ScriptError> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes)
        .map_err(|err| ScriptError::new(ErrorKind::Error, format!("Math.random failed: {err}")))?;
    let bits = u64::from_le_bytes(bytes) >> 11;
    Ok(bits as f64 / (1u64 << 53) as f64)
}
