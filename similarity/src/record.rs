//! Helpers for reading catalog records.

use serde_json::Value;

/// Field used to identify an object record.
pub const ID_FIELD: &str = "id";

/// Identifier of a record: the value itself for strings and numbers, the
/// `id` field for objects.
pub fn record_key(record: &Value) -> Option<String> {
    match record {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get(ID_FIELD).and_then(record_key),
        _ => None,
    }
}

/// Flatten a record into a single `key: value | key: value | ` line, fields
/// in the order they appear in the record.
///
/// Newlines inside values are replaced by spaces and both sides are trimmed.
/// Non-object records are rendered as their plain text.
pub fn describe_record(record: &Value) -> String {
    match record {
        Value::Object(map) => {
            let mut out = String::new();
            for (key, value) in map {
                out.push_str(&format!(
                    "{}: {} | ",
                    key.trim(),
                    plain_text(value).replace('\n', " ").trim()
                ));
            }
            out
        }
        other => plain_text(other),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_key() {
        assert_eq!(record_key(&json!("item_3")), Some("item_3".to_string()));
        assert_eq!(record_key(&json!(42)), Some("42".to_string()));
        assert_eq!(
            record_key(&json!({"id": "sku-1", "brand": "Acme"})),
            Some("sku-1".to_string())
        );
        assert_eq!(record_key(&json!({"brand": "Acme"})), None);
        assert_eq!(record_key(&json!(null)), None);
    }

    #[test]
    fn test_describe_record() {
        let record = json!({
            "name": " logo-print cotton cap ",
            "brand": "Acme",
            "description": "\n  A classic cap\nwith a logo.\n"
        });

        // fields keep the order they were written in
        assert_eq!(
            describe_record(&record),
            "name: logo-print cotton cap | brand: Acme | description: A classic cap with a logo. | "
        );

        let parsed: Value =
            serde_json::from_str(r#"{"title": "Cap", "color": "red", "brand": "Acme"}"#).unwrap();
        assert_eq!(
            describe_record(&parsed),
            "title: Cap | color: red | brand: Acme | "
        );
        assert_eq!(describe_record(&json!("plain")), "plain");
        assert_eq!(describe_record(&json!(7)), "7");
    }
}
