//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, Value};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_type_error() {
        let kind = ErrorKind::TypeError;
        assert!(matches!(kind, ErrorKind::TypeError));
        assert_eq!(kind.name(), "TypeError");
    }

    #[test]
    fn test_error_kind_aggregate_error() {
        assert_eq!(ErrorKind::AggregateError.to_string(), "AggregateError");
    }

    #[test]
    fn test_error_kind_equality() {
        assert_eq!(ErrorKind::RangeError, ErrorKind::RangeError);
        assert_ne!(ErrorKind::RangeError, ErrorKind::InternalError);
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_type_error_display() {
        let error = JsError::type_error("Promise resolver 42 is not a function");
        assert_eq!(
            error.to_string(),
            "TypeError: Promise resolver 42 is not a function"
        );
    }

    #[test]
    fn test_internal_error() {
        let error = JsError::internal("boom");
        assert_eq!(error.kind, ErrorKind::InternalError);
        assert_eq!(error.message, "boom");
    }

    #[test]
    fn test_aggregate_error_carries_reasons() {
        let error = JsError::aggregate(
            vec![Value::from("a"), Value::Smi(2)],
            "All promises were rejected",
        );
        assert_eq!(error.kind, ErrorKind::AggregateError);
        assert_eq!(error.errors.len(), 2);
        assert_eq!(error.errors[1], Value::Smi(2));
    }

    #[test]
    fn test_errors_compare_structurally() {
        assert_eq!(JsError::type_error("x"), JsError::type_error("x"));
        assert_ne!(JsError::type_error("x"), JsError::range_error("x"));
    }

    #[test]
    fn test_error_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&JsError::type_error("x"));
    }
}
