//! json-stable — deterministic JSON serialization with sorted object keys.
//!
//! Descriptor identities are built from these strings, so two attribute
//! maps that hold the same entries in a different insertion order must
//! serialize identically.

use serde_json::Value;

use crate::model::{Attrs, Mark};

/// Serialize `val` with object keys sorted at every level.
pub fn stringify(val: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, val);
    out
}

/// Stable form of an attribute map.
pub fn stringify_attrs(attrs: &Attrs) -> String {
    let mut out = String::new();
    write_object(&mut out, attrs);
    out
}

/// Stable form of a mark list. Mark order is kept; attributes are sorted.
pub fn stringify_marks(marks: &[Mark]) -> String {
    let mut out = String::from('[');
    for (i, mark) in marks.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str("{\"type\":");
        write_string(&mut out, &mark.kind);
        if !mark.attrs.is_empty() {
            out.push_str(",\"attrs\":");
            write_object(&mut out, &mark.attrs);
        }
        out.push('}');
    }
    out.push(']');
    out
}

fn write_value(out: &mut String, val: &Value) {
    match val {
        Value::String(s) => write_string(out, s),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(arr) => {
            out.push('[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(obj) => write_object(out, obj),
    }
}

fn write_object(out: &mut String, obj: &Attrs) {
    let mut keys: Vec<&String> = obj.keys().collect();
    keys.sort_unstable();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, &obj[key.as_str()]);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    // Serializing a str cannot fail
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(stringify(&json!(null)), "null");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!("a\"b")), "\"a\\\"b\"");
    }

    #[test]
    fn sorts_nested_keys() {
        let a = json!({"b": 1, "a": {"y": [1, {"d": 2, "c": 3}], "x": null}});
        assert_eq!(
            stringify(&a),
            r#"{"a":{"x":null,"y":[1,{"c":3,"d":2}]},"b":1}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut one = Attrs::new();
        one.insert("level".into(), json!(1));
        one.insert("id".into(), json!("h"));
        let mut two = Attrs::new();
        two.insert("id".into(), json!("h"));
        two.insert("level".into(), json!(1));
        assert_eq!(stringify_attrs(&one), stringify_attrs(&two));
        assert_eq!(stringify_attrs(&Attrs::new()), "{}");
    }

    #[test]
    fn marks_keep_order() {
        let marks = vec![
            Mark::new("link").with_attr("title", "t").with_attr("href", "/x"),
            Mark::new("bold"),
        ];
        assert_eq!(
            stringify_marks(&marks),
            r#"[{"type":"link","attrs":{"href":"/x","title":"t"}},{"type":"bold"}]"#
        );
        assert_eq!(stringify_marks(&[]), "[]");
    }
}
