//! Unit tests for Value enum

use core_types::{JsError, Value};

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_undefined() {
        let val = Value::Undefined;
        assert!(matches!(val, Value::Undefined));
    }

    #[test]
    fn test_value_smi_negative() {
        let val = Value::Smi(-100);
        assert!(matches!(val, Value::Smi(-100)));
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(7), Value::Smi(7));
        assert_eq!(Value::from(1.5), Value::Double(1.5));
        assert_eq!(Value::from("bad"), Value::String("bad".to_string()));
        assert_eq!(
            Value::from(vec![Value::Smi(1)]),
            Value::Array(vec![Value::Smi(1)])
        );
    }
}

#[cfg(test)]
mod value_semantics_tests {
    use super::*;

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::from("s").type_of(), "string");
        assert_eq!(Value::function(|_| Ok(Value::Undefined)).type_of(), "function");
        assert_eq!(Value::Array(vec![]).type_of(), "object");
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::Smi(42).to_string(), "42");
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_display_array_and_error() {
        let array = Value::Array(vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]);
        assert_eq!(array.to_string(), "1,2,3");
        let error: Value = JsError::type_error("nope").into();
        assert_eq!(error.to_string(), "TypeError: nope");
    }

    #[test]
    fn test_arrays_compare_structurally() {
        assert_eq!(
            Value::Array(vec![Value::Smi(1), Value::from("a")]),
            Value::Array(vec![Value::Smi(1), Value::from("a")])
        );
    }

    #[test]
    fn test_as_function() {
        assert!(Value::function(|_| Ok(Value::Null)).as_function().is_some());
        assert!(Value::Null.as_function().is_none());
        assert!(!Value::from("then").is_callable());
    }
}

#[cfg(test)]
mod value_serialize_tests {
    use super::*;

    #[test]
    fn test_serialize_record() {
        let record = Value::object([
            ("status", Value::from("fulfilled")),
            ("value", Value::Smi(1)),
        ]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"status":"fulfilled","value":1}"#);
    }

    #[test]
    fn test_serialize_aggregate_error() {
        let error: Value =
            JsError::aggregate(vec![Value::from("a"), Value::from("b")], "All promises were rejected")
                .into();
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(
            json,
            r#"{"name":"AggregateError","message":"All promises were rejected","errors":["a","b"]}"#
        );
    }

    #[test]
    fn test_serialize_undefined_as_null() {
        let json = serde_json::to_string(&Value::Array(vec![Value::Undefined, Value::Null])).unwrap();
        assert_eq!(json, "[null,null]");
    }
}
