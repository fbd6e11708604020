use crate::argument::ArgumentKind;
use crate::error::{BatonError, Result};
use crate::request::Request;
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved argument value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
    Bytes(Bytes),
    List(Vec<Value>),
    Request(Box<Request>),
    Service(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Json(_) => "json",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Request(_) => "request",
            Value::Service(_) => "service",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value may stand in for an argument of `kind`.
    pub(crate) fn fits(&self, kind: ArgumentKind) -> bool {
        match (self, kind) {
            (Value::Null, _) => true,
            (Value::String(_), ArgumentKind::String)
            | (Value::Int(_), ArgumentKind::Integer)
            | (Value::Int(_) | Value::Float(_), ArgumentKind::Float)
            | (Value::Bool(_), ArgumentKind::Boolean)
            | (Value::Bytes(_), ArgumentKind::Bytes) => true,
            (Value::Request(_) | Value::Service(_), _) => false,
            (_, ArgumentKind::Json) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::String(v) => f.debug_tuple("String").field(v).finish(),
            Value::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Value::Bytes(v) => f.debug_tuple("Bytes").field(v).finish(),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Request(r) => write!(f, "Request({} {})", r.method(), r.uri()),
            Value::Service(_) => f.write_str("Service(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Request(a), Value::Request(b)) => {
                a.method() == b.method() && a.uri() == b.uri() && a.body() == b.body()
            }
            (Value::Service(a), Value::Service(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

/// The ordered argument list a controller is invoked with.
///
/// Accessors are index based and check the value's kind; a mismatch means the
/// handler disagrees with the signature it was registered with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    fn expect(&self, index: usize, expected: &'static str) -> Result<&Value> {
        self.0
            .get(index)
            .ok_or(BatonError::ArgumentAccess { index, expected })
    }

    pub fn str(&self, index: usize) -> Result<&str> {
        match self.expect(index, "string")? {
            Value::String(s) => Ok(s),
            _ => Err(BatonError::ArgumentAccess { index, expected: "string" }),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        match self.expect(index, "integer")? {
            Value::Int(v) => Ok(*v),
            _ => Err(BatonError::ArgumentAccess { index, expected: "integer" }),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64> {
        match self.expect(index, "float")? {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            _ => Err(BatonError::ArgumentAccess { index, expected: "float" }),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        match self.expect(index, "boolean")? {
            Value::Bool(v) => Ok(*v),
            _ => Err(BatonError::ArgumentAccess { index, expected: "boolean" }),
        }
    }

    pub fn bytes(&self, index: usize) -> Result<&Bytes> {
        match self.expect(index, "bytes")? {
            Value::Bytes(v) => Ok(v),
            _ => Err(BatonError::ArgumentAccess { index, expected: "bytes" }),
        }
    }

    pub fn list(&self, index: usize) -> Result<&[Value]> {
        match self.expect(index, "list")? {
            Value::List(v) => Ok(v),
            _ => Err(BatonError::ArgumentAccess { index, expected: "list" }),
        }
    }

    pub fn request(&self, index: usize) -> Result<&Request> {
        match self.expect(index, "request")? {
            Value::Request(r) => Ok(r),
            _ => Err(BatonError::ArgumentAccess { index, expected: "request" }),
        }
    }

    /// `None` for a null value, `Some` otherwise.
    pub fn optional(&self, index: usize) -> Result<Option<&Value>> {
        match self.expect(index, "value")? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    /// Deserialize a json (or scalar) argument into `T`.
    pub fn json<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let json = match self.expect(index, "json")? {
            Value::Json(v) => v.clone(),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Value::from(*v),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Null => serde_json::Value::Null,
            _ => return Err(BatonError::ArgumentAccess { index, expected: "json" }),
        };
        serde_json::from_value(json).map_err(|e| {
            tracing::debug!("Argument {} does not deserialize: {}", index, e);
            BatonError::ArgumentAccess { index, expected: std::any::type_name::<T>() }
        })
    }

    /// A concrete service resolved from the container.
    pub fn service<T: 'static + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        match self.expect(index, "service")? {
            Value::Service(instance) => {
                instance
                    .clone()
                    .downcast::<T>()
                    .map_err(|_| BatonError::DowncastFailed {
                        type_name: std::any::type_name::<T>().to_string(),
                    })
            }
            _ => Err(BatonError::ArgumentAccess { index, expected: "service" }),
        }
    }

    /// A trait-object service bound with `Container::register_trait`.
    pub fn service_trait<T: ?Sized + 'static + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        match self.expect(index, "service")? {
            Value::Service(instance) => {
                let wrapper = instance.clone().downcast::<Arc<T>>().map_err(|_| {
                    BatonError::DowncastFailed {
                        type_name: std::any::type_name::<T>().to_string(),
                    }
                })?;
                Ok(wrapper.as_ref().clone())
            }
            _ => Err(BatonError::ArgumentAccess { index, expected: "service" }),
        }
    }
}

impl IntoIterator for Arguments {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct NewUser {
        name: String,
    }

    #[test]
    fn test_typed_access() {
        let args = Arguments::new(vec![
            Value::Int(7),
            Value::from("ada"),
            Value::Json(json!({ "name": "ada" })),
            Value::Null,
        ]);
        assert_eq!(args.int(0).unwrap(), 7);
        assert_eq!(args.float(0).unwrap(), 7.0);
        assert_eq!(args.str(1).unwrap(), "ada");
        assert_eq!(args.json::<NewUser>(2).unwrap(), NewUser { name: "ada".to_string() });
        assert!(args.optional(3).unwrap().is_none());
    }

    #[test]
    fn test_kind_mismatch() {
        let args = Arguments::new(vec![Value::from("ada")]);
        assert!(matches!(
            args.int(0),
            Err(BatonError::ArgumentAccess { index: 0, expected: "integer" })
        ));
        assert!(args.str(1).is_err());
    }

    #[test]
    fn test_service_access() {
        let instance: Arc<dyn Any + Send + Sync> = Arc::new(42u32);
        let args = Arguments::new(vec![Value::Service(instance)]);
        assert_eq!(*args.service::<u32>(0).unwrap(), 42);
        assert!(matches!(args.service::<u64>(0), Err(BatonError::DowncastFailed { .. })));
    }
}
