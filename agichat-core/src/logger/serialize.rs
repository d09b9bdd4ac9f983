// Storage-safe rendering of log details
// Errors do not serialize on their own, so they are flattened to message + cause chain

use std::error::Error;

use serde_json::{json, Map, Value};

use super::types::LogDetails;

pub fn serialize_error(error: &(dyn Error + 'static)) -> Value {
    let mut causes = Vec::new();
    let mut current = error.source();
    while let Some(cause) = current {
        causes.push(Value::String(cause.to_string()));
        current = cause.source();
    }

    let mut map = Map::new();
    map.insert("message".into(), json!(error.to_string()));
    map.insert("debug".into(), json!(format!("{:?}", error)));
    if !causes.is_empty() {
        map.insert("causes".into(), Value::Array(causes));
    }
    Value::Object(map)
}

pub fn serialize_details(details: &LogDetails) -> Value {
    match details {
        LogDetails::Value(value) => value.clone(),
        LogDetails::Error(error) => serialize_error(error.as_ref()),
        LogDetails::WithError { error, context } => {
            let mut map = context.clone();
            map.insert("error".into(), serialize_error(error.as_ref()));
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("upload failed")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection reset")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    impl Error for Inner {}

    #[test]
    fn test_serialize_error_chain() {
        let value = serialize_error(&Outer(Inner));
        assert_eq!(value["message"], "upload failed");
        assert_eq!(value["causes"], json!(["connection reset"]));
        assert!(value["debug"].as_str().unwrap().contains("Outer"));
    }

    #[test]
    fn test_serialize_details_variants() {
        let plain = serialize_details(&LogDetails::Value(json!({"retry": 2})));
        assert_eq!(plain, json!({"retry": 2}));

        let mut context = Map::new();
        context.insert("originalLogId".into(), json!("log-1"));
        let with = serialize_details(&LogDetails::with_error(Arc::new(Inner), context));
        assert_eq!(with["originalLogId"], "log-1");
        assert_eq!(with["error"]["message"], "connection reset");
        assert!(with["error"].get("causes").is_none());
    }
}
