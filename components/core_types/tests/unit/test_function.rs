//! Unit tests for Function and Object

use core_types::{Function, Object, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(test)]
mod function_tests {
    use super::*;

    #[test]
    fn test_function_receives_arguments() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let func = Function::new(move |args| {
            sink.borrow_mut().extend(args);
            Ok(Value::Undefined)
        });
        func.call(vec![Value::Smi(1), Value::Smi(2)]).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::Smi(1), Value::Smi(2)]);
    }

    #[test]
    fn test_function_can_throw() {
        let func = Function::new(|_| Err(Value::from("boom")));
        assert_eq!(func.call(vec![]), Err(Value::from("boom")));
    }
}

#[cfg(test)]
mod object_tests {
    use super::*;

    #[test]
    fn test_thenable_shape() {
        let object = Object::new();
        object.set("then", Value::function(|_| Ok(Value::Undefined)));
        assert!(object.get("then").unwrap().is_callable());
    }

    #[test]
    fn test_getter_replaced_by_data_property() {
        let object = Object::new();
        object.define_getter("then", Function::new(|_| Err(Value::from("trap"))));
        object.set("then", Value::Smi(1));
        assert_eq!(object.get("then"), Ok(Value::Smi(1)));
    }

    #[test]
    fn test_value_get_reads_object() {
        let value = Value::object([("reason", Value::from("e"))]);
        assert_eq!(value.get("reason"), Ok(Value::from("e")));
        assert_eq!(value.get("value"), Ok(Value::Undefined));
    }
}
