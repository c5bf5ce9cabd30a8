use serde_json::{Map, Value};

/// Structural equality of two JSON values.
///
/// Record key order is ignored, list order is not. Numbers compare by their
/// JSON representation: `1` and `1.0` are different values.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y),
        _ => false,
    }
}

fn objects_equal(x: &Map<String, Value>, y: &Map<String, Value>) -> bool {
    x.len() == y.len()
        && x
            .iter()
            .all(|(k, v)| y.get(k).is_some_and(|w| deep_equal(v, w)))
}

/// RFC 6901 pointer to the first location where `a` and `b` differ, or
/// `None` when they are deep-equal.
///
/// Lists are compared element by element; a length mismatch is reported at
/// the first index only one side has. Record keys are visited in `a`'s order,
/// then keys only `b` has.
pub fn first_difference(a: &Value, b: &Value) -> Option<String> {
    let mut path = Vec::new();
    if find(a, b, &mut path) {
        Some(format_pointer(&path))
    } else {
        None
    }
}

fn find(a: &Value, b: &Value, path: &mut Vec<String>) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            for (i, (l, r)) in x.iter().zip(y).enumerate() {
                path.push(i.to_string());
                if find(l, r, path) {
                    return true;
                }
                path.pop();
            }
            if x.len() != y.len() {
                path.push(x.len().min(y.len()).to_string());
                return true;
            }
            false
        }
        (Value::Object(x), Value::Object(y)) => {
            for (k, v) in x {
                path.push(k.clone());
                let differs = match y.get(k) {
                    Some(w) => find(v, w, path),
                    None => true,
                };
                if differs {
                    return true;
                }
                path.pop();
            }
            if let Some(k) = y.keys().find(|k| !x.contains_key(*k)) {
                path.push(k.clone());
                return true;
            }
            false
        }
        _ => !deep_equal(a, b),
    }
}

fn format_pointer(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&component.replace('~', "~0").replace('/', "~1"));
    }
    out
}
