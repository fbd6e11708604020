use crate::argument::{ArgumentContext, ArgumentResolver, Arguments};
use crate::config::KernelConfig;
use crate::controller::{Controller, ControllerRegistry};
use crate::error::{BatonError, NotFoundReason, Result};
use crate::request::{CONTROLLER_ATTRIBUTE, Request};
use crate::resolver::ControllerResolver;

/// Resolves the controller named by a request attribute.
///
/// Some earlier stage (usually [`crate::routing::RouteTable::apply`]) writes
/// the controller name and the path parameters into the request attributes;
/// this resolver looks the name up in a [`ControllerRegistry`] and treats the
/// remaining attributes as path parameters. Attributes starting with `_` are
/// reserved and never feed arguments.
#[derive(Clone)]
pub struct AttributeControllerResolver {
    registry: ControllerRegistry,
    arguments: ArgumentResolver,
    attribute: String,
}

impl AttributeControllerResolver {
    pub fn new(registry: ControllerRegistry, arguments: ArgumentResolver) -> Self {
        Self {
            registry,
            arguments,
            attribute: CONTROLLER_ATTRIBUTE.to_string(),
        }
    }

    /// Read the controller name from `attribute` instead of `_controller`.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }
}

impl ControllerResolver for AttributeControllerResolver {
    fn resolve_controller(&self, request: &Request) -> Result<Controller> {
        let name = request.attribute(&self.attribute).ok_or_else(|| {
            BatonError::not_found(NotFoundReason::MissingAttribute {
                attribute: self.attribute.clone(),
            })
        })?;

        self.registry.get(name).ok_or_else(|| {
            tracing::warn!("Request names unknown controller '{}'", name);
            BatonError::not_found(NotFoundReason::UnknownController {
                name: name.to_string(),
            })
        })
    }

    fn resolve_arguments(&self, request: &Request, controller: &Controller) -> Result<Arguments> {
        let path_params = request
            .attributes()
            .iter()
            .filter(|(key, _)| !key.starts_with('_') && **key != self.attribute)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        self.arguments.resolve(&ArgumentContext {
            request,
            controller,
            path_params: &path_params,
        })
    }

    fn controller_attribute(&self) -> Option<&str> {
        Some(&self.attribute)
    }

    fn configure(&mut self, config: &KernelConfig) {
        self.attribute = config.controller_attribute.clone();
    }
}
