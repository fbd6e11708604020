//! Controller argument signatures and their resolution.
//!
//! A controller declares its arguments once, at registration time, as a list
//! of [`ArgumentMetadata`]. At request time the [`ArgumentResolver`] walks that
//! list and asks each [`ValueResolver`] in a fixed precedence order for a
//! value:
//!
//! ```text
//! request -> path -> query -> body -> service -> default -> null -> []
//! ```
//!
//! `header` values are only used when an argument pins that source.

pub mod builtins;
mod convert;
mod resolver;
mod value;

pub use resolver::{ArgumentContext, ArgumentResolver, ValueResolver};
pub use value::{Arguments, Value};

use std::any::TypeId;
use strum_macros::{AsRefStr, Display, EnumString};

/// Where an argument value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ArgumentSource {
    Request,
    Path,
    Query,
    Body,
    Header,
    Service,
}

/// A service type identified at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceType {
    pub id: TypeId,
    pub name: &'static str,
}

impl ServiceType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// The declared type of a controller argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ArgumentKind {
    String,
    Integer,
    Float,
    Boolean,
    Json,
    Bytes,
    Request,
    Service(ServiceType),
}

/// One entry of a controller's normalized signature.
#[derive(Debug, Clone)]
pub struct ArgumentMetadata {
    name: String,
    kind: ArgumentKind,
    source: Option<ArgumentSource>,
    default: Option<Value>,
    nullable: bool,
    variadic: bool,
}

impl ArgumentMetadata {
    pub fn new(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source: None,
            default: None,
            nullable: false,
            variadic: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Boolean)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Json)
    }

    pub fn bytes(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Bytes)
    }

    /// The whole request.
    pub fn request(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Request)
    }

    /// A service registered in the container under `T`.
    ///
    /// `T` may be a concrete type or a `dyn Trait` bound with
    /// [`crate::di::Container::register_trait`].
    pub fn service<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Service(ServiceType::of::<T>()))
    }

    /// Only consult `source` (plus default/null fallbacks) for this argument.
    pub fn from_source(mut self, source: ArgumentSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Collect every value found at the source into a [`Value::List`].
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub fn source(&self) -> Option<ArgumentSource> {
        self.source
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Check the invariants of a single argument; returns a description of
    /// the first violation.
    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        if self.name.is_empty() {
            return Err("argument name must not be empty".to_string());
        }
        match self.kind {
            ArgumentKind::Request | ArgumentKind::Service(_) if self.variadic => {
                return Err(format!("{} argument '{}' cannot be variadic", self.kind, self.name));
            }
            ArgumentKind::Request
                if self.source.is_some_and(|s| s != ArgumentSource::Request) =>
            {
                return Err(format!("request argument '{}' must come from the request", self.name));
            }
            ArgumentKind::Service(_)
                if self.source.is_some_and(|s| s != ArgumentSource::Service) =>
            {
                return Err(format!("service argument '{}' must come from the container", self.name));
            }
            _ => {}
        }
        if let Some(default) = &self.default {
            if self.variadic {
                return Err(format!("variadic argument '{}' cannot declare a default", self.name));
            }
            if default.is_null() && !self.nullable {
                return Err(format!("default for '{}' is null but it is not nullable", self.name));
            }
            if !default.fits(self.kind) {
                return Err(format!(
                    "default for '{}' is a {}, expected {}",
                    self.name,
                    default.kind_name(),
                    self.kind
                ));
            }
        }
        Ok(())
    }
}
