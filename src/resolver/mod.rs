//! The controller resolution contract and its strategies.

mod attribute;
mod table;

pub use attribute::AttributeControllerResolver;
pub use table::RouteControllerResolver;

use crate::argument::Arguments;
use crate::config::KernelConfig;
use crate::controller::Controller;
use crate::error::Result;
use crate::request::Request;
use std::sync::Arc;

/// Decides which controller handles a request and what it is called with.
///
/// Callers invoke [`resolve_controller`](Self::resolve_controller) first and
/// only call [`resolve_arguments`](Self::resolve_arguments) with the
/// controller it returned. Neither method mutates the request, and
/// implementations must be safe to call concurrently for distinct requests.
pub trait ControllerResolver: Send + Sync + 'static {
    /// Fails with [`crate::BatonError::ControllerNotFound`] when no
    /// controller can be determined.
    fn resolve_controller(&self, request: &Request) -> Result<Controller>;

    /// Fails with [`crate::BatonError::ArgumentResolution`] when a required
    /// argument cannot be produced.
    fn resolve_arguments(&self, request: &Request, controller: &Controller) -> Result<Arguments>;

    /// The request attribute this resolver reads the controller name from,
    /// for resolvers that depend on a routing stage.
    fn controller_attribute(&self) -> Option<&str> {
        None
    }

    /// Adopt kernel settings. Called by [`crate::HttpKernel::with_config`].
    fn configure(&mut self, _config: &KernelConfig) {}
}

impl<R: ControllerResolver + ?Sized> ControllerResolver for Arc<R> {
    fn resolve_controller(&self, request: &Request) -> Result<Controller> {
        (**self).resolve_controller(request)
    }

    fn resolve_arguments(&self, request: &Request, controller: &Controller) -> Result<Arguments> {
        (**self).resolve_arguments(request, controller)
    }

    fn controller_attribute(&self) -> Option<&str> {
        (**self).controller_attribute()
    }

    /// Only reaches the inner resolver while this `Arc` is unshared.
    fn configure(&mut self, config: &KernelConfig) {
        if let Some(inner) = Arc::get_mut(self) {
            inner.configure(config);
        }
    }
}

impl<R: ControllerResolver + ?Sized> ControllerResolver for Box<R> {
    fn resolve_controller(&self, request: &Request) -> Result<Controller> {
        (**self).resolve_controller(request)
    }

    fn resolve_arguments(&self, request: &Request, controller: &Controller) -> Result<Arguments> {
        (**self).resolve_arguments(request, controller)
    }

    fn controller_attribute(&self) -> Option<&str> {
        (**self).controller_attribute()
    }

    fn configure(&mut self, config: &KernelConfig) {
        (**self).configure(config);
    }
}
