use crate::argument::builtins::{
    BodyValueResolver, HeaderValueResolver, PathValueResolver, QueryValueResolver,
    RequestValueResolver, ServiceValueResolver,
};
use crate::argument::{ArgumentKind, ArgumentMetadata, ArgumentSource, Arguments, Value};
use crate::controller::Controller;
use crate::di::Container;
use crate::error::{ArgumentFailure, BatonError, Result};
use crate::request::Request;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything a [`ValueResolver`] may read while producing a value.
pub struct ArgumentContext<'a> {
    pub request: &'a Request,
    pub controller: &'a Controller,
    /// Path parameters for the matched route.
    pub path_params: &'a BTreeMap<String, String>,
}

/// One step of the argument precedence chain.
///
/// `Ok(None)` means "nothing here, ask the next resolver". An `Err` stops the
/// chain: the value exists but is unusable.
pub trait ValueResolver: Send + Sync + 'static {
    fn source(&self) -> ArgumentSource;

    /// Whether arguments without a pinned source consult this resolver.
    fn implicit(&self) -> bool {
        true
    }

    fn resolve(
        &self,
        context: &ArgumentContext<'_>,
        argument: &ArgumentMetadata,
    ) -> std::result::Result<Option<Value>, ArgumentFailure>;
}

/// Builds a controller's [`Arguments`] from a request.
#[derive(Clone)]
pub struct ArgumentResolver {
    resolvers: Arc<Vec<Box<dyn ValueResolver>>>,
}

impl ArgumentResolver {
    /// The default chain: request, path, query, body, service (header only
    /// when pinned).
    pub fn new(container: Arc<Container>) -> Self {
        Self::with_resolvers(vec![
            Box::new(RequestValueResolver),
            Box::new(PathValueResolver),
            Box::new(QueryValueResolver),
            Box::new(BodyValueResolver),
            Box::new(HeaderValueResolver),
            Box::new(ServiceValueResolver::new(container)),
        ])
    }

    /// A custom chain, consulted in the given order.
    pub fn with_resolvers(resolvers: Vec<Box<dyn ValueResolver>>) -> Self {
        Self {
            resolvers: Arc::new(resolvers),
        }
    }

    pub fn resolve(&self, context: &ArgumentContext<'_>) -> Result<Arguments> {
        let controller = context.controller;
        let mut values = Vec::with_capacity(controller.arguments().len());

        for argument in controller.arguments() {
            let value = self
                .resolve_one(context, argument)
                .map_err(|failure| BatonError::argument(controller.name(), argument.name(), failure))?;
            values.push(value);
        }

        Ok(Arguments::new(values))
    }

    fn resolve_one(
        &self,
        context: &ArgumentContext<'_>,
        argument: &ArgumentMetadata,
    ) -> std::result::Result<Value, ArgumentFailure> {
        let candidates = self.resolvers.iter().filter(|r| match argument.source() {
            Some(source) => r.source() == source,
            None => r.implicit(),
        });

        for resolver in candidates {
            match resolver.resolve(context, argument)? {
                Some(Value::Null) => return Self::null_or_default(argument),
                Some(value) => {
                    tracing::trace!(
                        "Argument '{}' of '{}' resolved from {}",
                        argument.name(),
                        context.controller.name(),
                        resolver.source()
                    );
                    return Ok(value);
                }
                None => continue,
            }
        }

        if let Some(default) = argument.default_value() {
            return Ok(default.clone());
        }
        if argument.is_nullable() {
            return Ok(Value::Null);
        }
        if argument.is_variadic() {
            return Ok(Value::List(Vec::new()));
        }
        match argument.kind() {
            ArgumentKind::Service(service) => Err(ArgumentFailure::ServiceUnavailable {
                type_name: service.name.to_string(),
            }),
            _ => Err(ArgumentFailure::Missing),
        }
    }

    /// An explicit null: use it if allowed, else fall back to the default,
    /// else an empty list for variadic arguments.
    fn null_or_default(argument: &ArgumentMetadata) -> std::result::Result<Value, ArgumentFailure> {
        if argument.is_nullable() {
            Ok(Value::Null)
        } else if let Some(default) = argument.default_value() {
            Ok(default.clone())
        } else if argument.is_variadic() {
            Ok(Value::List(Vec::new()))
        } else {
            Err(ArgumentFailure::NotNullable)
        }
    }
}

impl Default for ArgumentResolver {
    fn default() -> Self {
        Self::new(Arc::new(Container::new()))
    }
}
