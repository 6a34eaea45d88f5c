//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` configuration against a [`Schema`] and
//! reports problems as diagnostics, one per offending attribute.
//!
//! # Example
//!
//! ```
//! use newrelic_provider::schema::{Attribute, Schema};
//! use newrelic_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("account_id", Attribute::optional_int64());
//!
//! let diagnostics = validate(&schema, &json!({"name": "berlin", "account_id": 42}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "berlin", "account_id": "42"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("account_id".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use serde_json::{Map, Value};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - The value must be an object; `null` counts as an empty one
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Strings with allowed values must be one of them
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let empty = Map::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(other))),
            );
            return diagnostics;
        },
    };

    for (name, attr) in &schema.block.attributes {
        validate_attribute(name, attr, obj.get(name), &mut diagnostics);
    }

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attribute(
    name: &str,
    attr: &Attribute,
    value: Option<&Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", name))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(name),
                );
            }
        },
        Some(v) => {
            if !matches_type(attr.attr_type, v) {
                diagnostics.push(type_error(name, attr.attr_type, v));
                return;
            }
            if let Some(s) = v.as_str() {
                if !attr.allowed_values.is_empty() && !attr.allowed_values.iter().any(|a| a == s) {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid value for attribute '{}'", name))
                            .with_detail(format!(
                                "Expected one of [{}], got \"{}\"",
                                attr.allowed_values.join(", "),
                                s
                            ))
                            .with_attribute(name),
                    );
                }
            }
        },
    }
}

fn matches_type(attr_type: AttributeType, value: &Value) -> bool {
    match attr_type {
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => is_int64(value),
        AttributeType::Bool => value.is_boolean(),
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || integral_float(value).is_some(),
        _ => false,
    }
}

// hosts may hand us 42.0 for an integer attribute
fn integral_float(value: &Value) -> Option<i64> {
    let f = value.as_f64().filter(|_| !value.is_i64() && !value.is_u64())?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
}

/// Rewrite top-level integral floats such as `42.0` as integers, so typed
/// decoding accepts every value [`validate`] accepts as int64.
pub fn normalize_integers(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(name, v)| match integral_float(&v) {
                    Some(i) => (name, Value::from(i)),
                    None => (name, v),
                })
                .collect(),
        ),
        other => other,
    }
}

fn type_error(name: &str, expected: AttributeType, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", name))
        .with_detail(format!(
            "Expected {}, got {}",
            expected.name(),
            value_type_name(got)
        ))
        .with_attribute(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "berlin"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("account_id", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"account_id": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"account_id": null})).is_empty());
        assert_eq!(
            validate(&schema, &json!({"account_id": "not a number"})).len(),
            1
        );
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_optional_computed_attribute_is_type_checked() {
        let schema =
            Schema::v0().with_attribute("account_id", Attribute::optional_computed_int64());

        assert!(validate(&schema, &json!({})).is_empty());
        assert_eq!(validate(&schema, &json!({"account_id": true})).len(), 1);
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute(
            "account_id",
            Attribute::new(AttributeType::Int64, crate::schema::AttributeFlags::required()),
        );

        assert!(validate(&schema, &json!({"account_id": 42})).is_empty());
        assert!(validate(&schema, &json!({"account_id": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"account_id": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"account_id": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_bool() {
        let schema = Schema::v0().with_attribute("enabled", Attribute::required_bool());

        assert!(validate(&schema, &json!({"enabled": true})).is_empty());
        assert!(validate(&schema, &json!({"enabled": false})).is_empty());
        assert_eq!(validate(&schema, &json!({"enabled": "true"})).len(), 1);
    }

    #[test]
    fn test_validate_allowed_values() {
        let schema = Schema::v0().with_attribute(
            "matching_method",
            Attribute::required_string().with_allowed_values(["EQUALS", "LIKE"]),
        );

        assert!(validate(&schema, &json!({"matching_method": "EQUALS"})).is_empty());
        assert!(validate(&schema, &json!({"matching_method": "LIKE"})).is_empty());

        let diagnostics = validate(&schema, &json!({"matching_method": "equals"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid value"));
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("EQUALS, LIKE"));
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("account_id", Attribute::optional_int64())
            .with_attribute("enabled", Attribute::required_bool());

        let diagnostics = validate(
            &schema,
            &json!({"name": 123, "account_id": "not a number", "enabled": "yes"}),
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_is_valid_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "berlin"})));
        assert!(!is_valid(&schema, &json!({})));
    }

    #[test]
    fn test_validate_result_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate_result(&schema, &json!({"name": "berlin"})).is_ok());

        let result = validate_result(&schema, &json!({}));
        assert_eq!(result.unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }

    #[test]
    fn test_validate_null_root_reports_required_attributes() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("account_id", Attribute::optional_int64());

        let diagnostics = validate(&schema, &Value::Null);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));

        let optional_only = Schema::v0().with_attribute("account_id", Attribute::optional_int64());
        assert!(validate(&optional_only, &Value::Null).is_empty());
    }

    #[test]
    fn test_normalize_integers() {
        let normalized = normalize_integers(json!({
            "account_id": 1234.0,
            "ratio": 0.5,
            "count": 7,
            "name": "berlin"
        }));

        assert!(normalized["account_id"].is_i64());
        assert_eq!(normalized["account_id"], 1234);
        assert_eq!(normalized["ratio"], 0.5);
        assert_eq!(normalized["count"], 7);
        assert_eq!(normalized["name"], "berlin");
        assert_eq!(normalize_integers(Value::Null), Value::Null);
    }
}
