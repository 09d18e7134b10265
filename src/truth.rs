//! Boolean coercion for attribute values.

use crate::error::{ChangelogError, ChangelogResult};
use crate::model::Value;

/// Read `value` as a boolean, falling back to `default` when it is absent.
///
/// Native booleans pass through and `"true"`/`"false"` are accepted in any
/// case, matching the host engine's own coercion. `null` counts as absent.
/// Anything else is an error naming `attribute`.
pub fn parse_truth(attribute: &str, value: Option<&Value>, default: bool) -> ChangelogResult<bool> {
    match value {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Text(s)) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::Text(s)) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        Some(other) => Err(ChangelogError::invalid_value(
            attribute,
            other.to_string(),
            "a boolean",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_and_string_forms() {
        assert!(parse_truth("a", Some(&Value::Bool(true)), false).unwrap());
        assert!(parse_truth("a", Some(&Value::from("true")), false).unwrap());
        assert!(parse_truth("a", Some(&Value::from("TRUE")), false).unwrap());
        assert!(!parse_truth("a", Some(&Value::from("False")), true).unwrap());
    }

    #[test]
    fn test_absent_uses_default() {
        assert!(!parse_truth("a", None, false).unwrap());
        assert!(parse_truth("a", None, true).unwrap());
        assert!(parse_truth("a", Some(&Value::Null), true).unwrap());
    }

    #[test]
    fn test_rejects_non_boolean() {
        let err = parse_truth("runAlways", Some(&Value::from("notabool")), false).unwrap_err();
        assert!(err.to_string().contains("runAlways"));
        assert!(parse_truth("x", Some(&Value::Int(1)), false).is_err());
    }
}
