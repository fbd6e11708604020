//! Controllers: named handlers with a normalized argument signature.
//!
//! Every controller has the same call shape, `Arguments -> Result<Response>`.
//! What varies is the signature declared at registration, which tells the
//! [`crate::argument::ArgumentResolver`] what to build.

mod registry;

pub use registry::ControllerRegistry;

use crate::argument::{ArgumentMetadata, Arguments};
use crate::error::{BatonError, Result};
use async_trait::async_trait;
use axum::response::{IntoResponse, Response};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// The executable part of a controller.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, arguments: Arguments) -> Result<Response>;
}

/// Adapts an async closure into a [`Handler`].
pub struct HandlerFn<F, R> {
    f: F,
    _response: PhantomData<fn() -> R>,
}

/// Wrap `f` so it can be used as a controller handler.
///
/// ```
/// use baton::controller::handler_fn;
/// use baton::argument::Arguments;
///
/// let handler = handler_fn(|args: Arguments| async move {
///     Ok(format!("hello {}", args.str(0)?))
/// });
/// ```
pub fn handler_fn<F, Fut, R>(f: F) -> HandlerFn<F, R>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + 'static,
{
    HandlerFn {
        f,
        _response: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, R> Handler for HandlerFn<F, R>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + 'static,
{
    async fn call(&self, arguments: Arguments) -> Result<Response> {
        (self.f)(arguments).await.map(IntoResponse::into_response)
    }
}

struct ControllerInner {
    name: String,
    arguments: Vec<ArgumentMetadata>,
    handler: Arc<dyn Handler>,
}

/// A resolved, invokable unit. Cheap to clone.
///
/// Two controllers are equal when they share a name and the same handler
/// instance.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

impl Controller {
    pub fn builder(name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder {
            name: name.into(),
            arguments: Vec::new(),
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn arguments(&self) -> &[ArgumentMetadata] {
        &self.inner.arguments
    }

    pub async fn invoke(&self, arguments: Arguments) -> Result<Response> {
        if arguments.len() != self.inner.arguments.len() {
            return Err(BatonError::Internal(format!(
                "controller '{}' takes {} arguments, got {}",
                self.name(),
                self.inner.arguments.len(),
                arguments.len()
            )));
        }
        tracing::debug!("Invoking controller {}", self.name());
        self.inner.handler.call(arguments).await
    }
}

impl PartialEq for Controller {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
            && Arc::ptr_eq(&self.inner.handler, &other.inner.handler)
    }
}

impl Eq for Controller {}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.inner.name)
            .field("arguments", &self.inner.arguments)
            .finish_non_exhaustive()
    }
}

pub struct ControllerBuilder {
    name: String,
    arguments: Vec<ArgumentMetadata>,
    handler: Option<Arc<dyn Handler>>,
}

impl ControllerBuilder {
    pub fn argument(mut self, argument: ArgumentMetadata) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Share one handler between several controllers.
    pub fn shared_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Validate the signature and build the controller.
    pub fn build(self) -> Result<Controller> {
        let invalid = |message: String| BatonError::invalid_controller(&self.name, message);

        if self.name.is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        for (position, argument) in self.arguments.iter().enumerate() {
            argument.check().map_err(invalid)?;
            if !seen.insert(argument.name()) {
                return Err(invalid(format!("duplicate argument '{}'", argument.name())));
            }
            if argument.is_variadic() && position + 1 != self.arguments.len() {
                return Err(invalid(format!(
                    "variadic argument '{}' must be last",
                    argument.name()
                )));
            }
        }
        let handler = self
            .handler
            .clone()
            .ok_or_else(|| invalid("no handler".to_string()))?;

        Ok(Controller {
            inner: Arc::new(ControllerInner {
                name: self.name,
                arguments: self.arguments,
                handler,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Value;
    use axum::http::StatusCode;

    fn greet() -> ControllerBuilder {
        Controller::builder("greet").argument(ArgumentMetadata::string("name"))
    }

    #[tokio::test]
    async fn test_invoke() {
        let controller = greet()
            .handler(handler_fn(|args: Arguments| async move {
                Ok(format!("hello {}", args.str(0)?))
            }))
            .build()
            .unwrap();

        let response = controller
            .invoke(Arguments::new(vec![Value::from("ada")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let err = controller.invoke(Arguments::default()).await.unwrap_err();
        assert!(matches!(err, BatonError::Internal(_)));
    }

    #[test]
    fn test_signature_validation() {
        let noop = || handler_fn(|_args: Arguments| async { Ok(()) });

        assert!(greet().build().is_err());
        assert!(
            greet()
                .argument(ArgumentMetadata::string("name"))
                .handler(noop())
                .build()
                .is_err()
        );
        assert!(
            Controller::builder("list")
                .argument(ArgumentMetadata::string("tags").variadic())
                .argument(ArgumentMetadata::integer("page"))
                .handler(noop())
                .build()
                .is_err()
        );
        assert!(greet().handler(noop()).build().is_ok());
    }

    #[test]
    fn test_equality() {
        let handler: Arc<dyn Handler> = Arc::new(handler_fn(|_args: Arguments| async { Ok(()) }));
        let a = Controller::builder("a").shared_handler(handler.clone()).build().unwrap();
        let b = Controller::builder("a").shared_handler(handler).build().unwrap();
        let c = Controller::builder("a")
            .handler(handler_fn(|_args: Arguments| async { Ok(()) }))
            .build()
            .unwrap();
        assert_eq!(a, a.clone());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
