use crate::argument::{ArgumentContext, ArgumentResolver, Arguments};
use crate::controller::{Controller, ControllerRegistry};
use crate::error::{BatonError, NotFoundReason, Result};
use crate::request::Request;
use crate::resolver::ControllerResolver;
use crate::routing::RouteTable;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Resolves controllers by matching the request against a [`RouteTable`].
///
/// Needs no earlier routing stage. Path parameters are recomputed from the
/// table during argument resolution, so the request is never written to.
#[derive(Clone)]
pub struct RouteControllerResolver {
    routes: Arc<RouteTable>,
    registry: ControllerRegistry,
    arguments: ArgumentResolver,
}

impl RouteControllerResolver {
    pub fn new(
        routes: Arc<RouteTable>,
        registry: ControllerRegistry,
        arguments: ArgumentResolver,
    ) -> Self {
        Self {
            routes,
            registry,
            arguments,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Check that every route points at a registered controller.
    pub fn verify(&self) -> Result<()> {
        for route in self.routes.routes() {
            if !self.registry.contains(route.controller()) {
                return Err(BatonError::invalid_route(
                    route.pattern().as_str(),
                    format!("controller '{}' is not registered", route.controller()),
                ));
            }
        }
        Ok(())
    }
}

impl ControllerResolver for RouteControllerResolver {
    fn resolve_controller(&self, request: &Request) -> Result<Controller> {
        let found = self
            .routes
            .match_route(request.method(), request.path())
            .map_err(BatonError::not_found)?;

        tracing::debug!(
            "{} {} matched {}",
            request.method(),
            request.path(),
            found.route.pattern().as_str()
        );

        self.registry.get(found.route.controller()).ok_or_else(|| {
            BatonError::not_found(NotFoundReason::UnknownController {
                name: found.route.controller().to_string(),
            })
        })
    }

    fn resolve_arguments(&self, request: &Request, controller: &Controller) -> Result<Arguments> {
        let mut path_params: BTreeMap<String, String> = request
            .attributes()
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        match self.routes.match_route(request.method(), request.path()) {
            Ok(found) if found.route.controller() == controller.name() => {
                path_params.extend(found.params);
            }
            _ => tracing::debug!(
                "Controller {} was not matched from this table, no path parameters",
                controller.name()
            ),
        }

        self.arguments.resolve(&ArgumentContext {
            request,
            controller,
            path_params: &path_params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{ArgumentMetadata, Value};
    use crate::controller::handler_fn;
    use crate::error::ArgumentFailure;
    use axum::http::Method;

    fn resolver() -> RouteControllerResolver {
        let registry = ControllerRegistry::new();
        registry
            .register(
                Controller::builder("posts.show")
                    .argument(ArgumentMetadata::string("slug"))
                    .handler(handler_fn(|args: Arguments| async move {
                        Ok(args.str(0)?.to_string())
                    }))
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .register(
                Controller::builder("posts.search")
                    .argument(ArgumentMetadata::string("q"))
                    .handler(handler_fn(|_args: Arguments| async { Ok(()) }))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let mut routes = RouteTable::new();
        routes
            .get("/posts/{slug}", "posts.show")
            .unwrap()
            .get("/search", "posts.search")
            .unwrap()
            .get("/drafts", "posts.drafts")
            .unwrap();

        RouteControllerResolver::new(Arc::new(routes), registry, ArgumentResolver::default())
    }

    #[test]
    fn test_one_path_parameter() {
        let resolver = resolver();
        let request = Request::get("/posts/hello-world").unwrap();

        let controller = resolver.resolve_controller(&request).unwrap();
        assert_eq!(controller.name(), "posts.show");
        assert_eq!(resolver.resolve_controller(&request).unwrap(), controller);

        let args = resolver.resolve_arguments(&request, &controller).unwrap();
        assert_eq!(args.into_vec(), vec![Value::from("hello-world")]);
        assert!(request.attributes().is_empty());
    }

    #[test]
    fn test_no_registered_handler() {
        let resolver = resolver();

        let err = resolver.resolve_controller(&Request::get("/authors").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            BatonError::ControllerNotFound {
                reason: NotFoundReason::NoRoute { .. }
            }
        ));

        let post = Request::builder(Method::POST, "/posts/a").build().unwrap();
        let err = resolver.resolve_controller(&post).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::METHOD_NOT_ALLOWED);

        let err = resolver.resolve_controller(&Request::get("/drafts").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            BatonError::ControllerNotFound {
                reason: NotFoundReason::UnknownController { .. }
            }
        ));
    }

    #[test]
    fn test_absent_required_argument() {
        let resolver = resolver();
        let request = Request::get("/search").unwrap();
        let controller = resolver.resolve_controller(&request).unwrap();

        let err = resolver.resolve_arguments(&request, &controller).unwrap_err();
        assert!(matches!(
            err,
            BatonError::ArgumentResolution { ref argument, failure: ArgumentFailure::Missing, .. }
                if argument == "q"
        ));
    }

    #[test]
    fn test_verify_reports_dangling_routes() {
        assert!(matches!(resolver().verify(), Err(BatonError::InvalidRoute { .. })));
    }
}
