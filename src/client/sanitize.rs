//! JSON sanitization applied to response bodies before typed decoding.
//!
//! The upstream API is known to emit inconsistent blank and garbage values:
//! explicit `null`s, whitespace-only strings, and free-text fields with a
//! stray space before a closing period. This pass normalizes all of that
//! away so schema validation sees a value only where one genuinely exists.

use serde_json::Value;

/// Recursively sanitize a JSON value.
///
/// Returns `None` when the value sanitizes away entirely:
/// - `null` is dropped;
/// - strings that are empty after trimming are dropped;
/// - object keys whose sanitized value is dropped disappear;
/// - array elements that sanitize away are removed.
///
/// Strings additionally lose any whitespace run immediately preceding a
/// period (`"USD Cash ."` becomes `"USD Cash."`). Numbers and booleans pass
/// through untouched. The pass is idempotent: sanitizing an already
/// sanitized value yields the identical value.
///
/// # Example
///
/// ```
/// use saxo_rs::client::sanitize::sanitize;
/// use serde_json::json;
///
/// let cleaned = sanitize(json!({
///     "Description": "Apple Inc .",
///     "Symbol": "  ",
///     "ExchangeId": null,
///     "Identifier": 211
/// }));
/// assert_eq!(
///     cleaned,
///     Some(json!({ "Description": "Apple Inc.", "Identifier": 211 }))
/// );
/// ```
pub fn sanitize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(text) => {
            let cleaned = clean_text(&text);
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::String(cleaned))
            }
        }
        Value::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(sanitize).collect(),
        )),
        Value::Object(entries) => Some(Value::Object(
            entries
                .into_iter()
                .filter_map(|(key, value)| sanitize(value).map(|value| (key, value)))
                .collect(),
        )),
        other => Some(other),
    }
}

/// Sanitize a whole response body, keeping `Value::Null` as the stand-in
/// when the body sanitizes away entirely.
pub(crate) fn sanitize_body(value: Value) -> Value {
    sanitize(value).unwrap_or(Value::Null)
}

/// Trim a string and remove any whitespace run immediately preceding a
/// period.
///
/// Removing the whole run (rather than replacing one `" ."` occurrence)
/// keeps the operation idempotent: no output of this function contains
/// whitespace before a period.
fn clean_text(text: &str) -> String {
    let trimmed = text.trim();
    let mut cleaned = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if ch == '.' {
            while cleaned.ends_with(|c: char| c.is_whitespace()) {
                cleaned.pop();
            }
        }
        cleaned.push(ch);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_nulls_and_blank_strings() {
        let cleaned = sanitize(json!({
            "a": null,
            "b": "",
            "c": "   ",
            "d": "keep",
            "e": 0,
            "f": false
        }));
        assert_eq!(cleaned, Some(json!({ "d": "keep", "e": 0, "f": false })));
    }

    #[test]
    fn test_space_before_period_artifact() {
        assert_eq!(
            sanitize(json!("USD Cash .")),
            Some(json!("USD Cash."))
        );
        assert_eq!(sanitize(json!("a  .")), Some(json!("a.")));
        assert_eq!(sanitize(json!("a . b . c")), Some(json!("a. b. c")));
        // untouched when there is nothing to fix
        assert_eq!(sanitize(json!("2.5 percent")), Some(json!("2.5 percent")));
    }

    #[test]
    fn test_nested_structures() {
        let cleaned = sanitize(json!({
            "Data": [
                { "Description": "ok", "Noise": null },
                { "Description": " " },
                null,
                "standalone ."
            ],
            "Empty": {}
        }));
        assert_eq!(
            cleaned,
            Some(json!({
                "Data": [
                    { "Description": "ok" },
                    {},
                    "standalone."
                ],
                "Empty": {}
            }))
        );
    }

    #[test]
    fn test_whole_value_sanitizes_away() {
        assert_eq!(sanitize(json!(null)), None);
        assert_eq!(sanitize(json!("  ")), None);
        assert_eq!(sanitize_body(json!(null)), Value::Null);
    }

    #[test]
    fn test_idempotence() {
        let messy = json!({
            "a": "trailing space  ",
            "b": ["x .", { "y": "  mixed . text ." }],
            "c": { "d": null, "e": "value" }
        });
        let once = sanitize(messy).unwrap();
        let twice = sanitize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_arrays_preserve_order_of_survivors() {
        let cleaned = sanitize(json!(["first", null, "second", " ", "third"]));
        assert_eq!(cleaned, Some(json!(["first", "second", "third"])));
    }
}
