//! Field-level comparison between current and desired state.
//!
//! Arrays compare as multisets: element order returned by the backend is
//! not meaningful, so `["SSH", "RDP"]` equals `["RDP", "SSH"]`. Every
//! other value kind compares for exact equality, including nested
//! objects.

use serde_json::Value;

use crate::fields::FieldSet;
use crate::policy::FieldPolicy;

/// Compare two JSON values, treating arrays as order-insensitive
/// multisets.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut left: Vec<String> = xs.iter().map(Value::to_string).collect();
            let mut right: Vec<String> = ys.iter().map(Value::to_string).collect();
            left.sort();
            right.sort();
            left == right
        }
        _ => a == b,
    }
}

/// Names of fields whose desired value differs from current.
///
/// Two checks run, always both:
///
/// 1. every field in `desired` that is missing from `current` or has a
///    different value there;
/// 2. every list-clearable field that is non-empty in `current` but
///    absent from `desired` (omission reads as "desired: empty").
pub fn differing_fields(current: &FieldSet, desired: &FieldSet, policy: &FieldPolicy) -> Vec<String> {
    let mut names = Vec::new();

    for (name, wanted) in desired.iter() {
        match current.get(name) {
            Some(have) if values_equal(have, wanted) => {}
            _ => names.push(name.clone()),
        }
    }

    for &name in policy.list_clearable {
        if desired.has(name) {
            continue;
        }
        if let Some(Value::Array(items)) = current.get(name) {
            if !items.is_empty() {
                names.push(name.to_string());
            }
        }
    }

    names
}

/// True when `desired` would change anything in `current`.
pub fn is_different(current: &FieldSet, desired: &FieldSet, policy: &FieldPolicy) -> bool {
    !differing_fields(current, desired, policy).is_empty()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: serde_json::Value) -> FieldSet {
        FieldSet::try_from_value(value).unwrap()
    }

    static CLEARABLE: FieldPolicy = FieldPolicy {
        mutable: &["description", "subprotocols"],
        create_only: &[],
        list_clearable: &["subprotocols"],
        gated: &[],
    };

    #[test]
    fn test_arrays_compare_as_multisets() {
        assert!(values_equal(
            &json!(["SSH_SHELL_SESSION", "SSH_REMOTE_COMMAND"]),
            &json!(["SSH_REMOTE_COMMAND", "SSH_SHELL_SESSION"]),
        ));
        assert!(!values_equal(&json!(["SSH"]), &json!(["SSH", "SSH"])));
        assert!(!values_equal(&json!(["SSH"]), &json!(["RDP"])));
    }

    #[test]
    fn test_duplicates_respect_multiplicity() {
        assert!(values_equal(&json!(["a", "b", "a"]), &json!(["a", "a", "b"])));
        assert!(!values_equal(&json!(["a", "b", "b"]), &json!(["a", "a", "b"])));
    }

    #[test]
    fn test_scalars_compare_exactly() {
        assert!(values_equal(&json!("x"), &json!("x")));
        assert!(!values_equal(&json!("x"), &json!("y")));
        assert!(!values_equal(&json!(1), &json!("1")));
        assert!(!values_equal(&json!(true), &json!(Value::Null)));
    }

    #[test]
    fn test_desired_field_missing_from_current() {
        let current = fields(json!({"description": "old"}));
        let desired = fields(json!({"description": "old", "profile": "user"}));
        assert_eq!(differing_fields(&current, &desired, &CLEARABLE), vec!["profile"]);
    }

    #[test]
    fn test_omitted_clearable_list_counts_as_difference() {
        let current = fields(json!({"description": "d", "subprotocols": ["SSH_SHELL_SESSION"]}));
        let desired = fields(json!({"description": "d"}));
        assert_eq!(
            differing_fields(&current, &desired, &CLEARABLE),
            vec!["subprotocols"]
        );
    }

    #[test]
    fn test_omitted_clearable_list_already_empty_is_equal() {
        let current = fields(json!({"description": "d", "subprotocols": []}));
        let desired = fields(json!({"description": "d"}));
        assert!(!is_different(&current, &desired, &CLEARABLE));
    }

    #[test]
    fn test_clearable_check_runs_alongside_value_diff() {
        let current = fields(json!({"description": "old", "subprotocols": ["SSH_SHELL_SESSION"]}));
        let desired = fields(json!({"description": "new"}));
        let diff = differing_fields(&current, &desired, &CLEARABLE);
        assert!(diff.contains(&"description".to_string()));
        assert!(diff.contains(&"subprotocols".to_string()));
    }

    #[test]
    fn test_identical_states_have_no_diff() {
        let current = fields(json!({"description": "d", "subprotocols": ["A", "B"]}));
        let desired = fields(json!({"description": "d", "subprotocols": ["B", "A"]}));
        assert!(!is_different(&current, &desired, &CLEARABLE));
    }
}
