//! The dispatch loop around a [`ControllerResolver`].
//!
//! ```text
//! http::Request ─► buffer body ─► [routing stage] ─► resolve_controller
//!                                                         │
//!            Response ◄─ ExceptionFilter ◄─ error ◄───────┤
//!                 ▲                                       ▼
//!                 └──────── invoke ◄──────────── resolve_arguments
//! ```

mod service;
mod shutdown;

pub use service::KernelService;
pub use shutdown::shutdown_signal;

use crate::config::KernelConfig;
use crate::error::{BatonError, Result};
use crate::exception::{ExceptionFilter, JsonExceptionFilter};
use crate::request::Request;
use crate::resolver::ControllerResolver;
use crate::routing::RouteTable;
use axum::{
    body::Body,
    http::{self, HeaderValue},
    response::Response,
};
use std::sync::Arc;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HttpKernel<R> {
    resolver: R,
    routes: Option<Arc<RouteTable>>,
    filter: Arc<dyn ExceptionFilter>,
    config: KernelConfig,
}

impl<R: ControllerResolver> HttpKernel<R> {
    /// The routing stage writes whichever attribute the resolver reads.
    pub fn new(resolver: R) -> Self {
        let mut config = KernelConfig::default();
        if let Some(attribute) = resolver.controller_attribute() {
            config.controller_attribute = attribute.to_string();
        }
        Self {
            resolver,
            routes: None,
            filter: Arc::new(JsonExceptionFilter::new(config.expose_errors)),
            config,
        }
    }

    /// Replace the configuration and hand it to the resolver, so both sides
    /// agree on `controller_attribute`. Also resets the exception filter to a
    /// [`JsonExceptionFilter`] honoring `expose_errors`; set a custom filter
    /// after this call.
    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.resolver.configure(&config);
        self.filter = Arc::new(JsonExceptionFilter::new(config.expose_errors));
        self.config = config;
        self
    }

    /// Run `routes` as a routing stage before resolution, writing the
    /// controller name and path parameters into request attributes.
    pub fn with_routes(mut self, routes: Arc<RouteTable>) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn with_exception_filter(mut self, filter: impl ExceptionFilter) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Route, resolve and invoke, surfacing every failure to the caller.
    ///
    /// Arguments are only resolved once a controller has been found.
    pub async fn dispatch(&self, mut request: Request) -> Result<Response> {
        if let Some(routes) = &self.routes {
            routes
                .apply(&mut request, &self.config.controller_attribute)
                .map_err(BatonError::not_found)?;
        }

        let controller = self.resolver.resolve_controller(&request)?;
        tracing::debug!("Resolved controller {}", controller.name());

        let arguments = self.resolver.resolve_arguments(&request, &controller)?;
        controller.invoke(arguments).await
    }

    /// [`dispatch`](Self::dispatch) with errors rendered by the exception filter.
    pub async fn handle(&self, request: Request) -> Response {
        let request_id = request
            .header(REQUEST_ID_HEADER)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let span = tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.path(),
            request_id = %request_id,
        );

        let mut response = async {
            match self.dispatch(request).await {
                Ok(response) => response,
                Err(error) => self.filter.catch(error),
            }
        }
        .instrument(span)
        .await;

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    pub(crate) async fn handle_http(&self, request: http::Request<Body>) -> Response {
        match Request::from_http(request, self.config.body_limit).await {
            Ok(request) => self.handle(request).await,
            Err(error) => self.filter.catch(error),
        }
    }

    pub fn into_service(self) -> KernelService<R> {
        KernelService::new(Arc::new(self))
    }

    /// An `axum::Router` that sends every request to this kernel.
    pub fn into_router(self) -> axum::Router {
        axum::Router::new().fallback_service(self.into_service())
    }

    /// Serve on `listener` until Ctrl+C or SIGTERM.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> std::io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Listening on http://{}", addr);
        }
        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                tracing::info!("Initiating graceful shutdown...");
            })
            .await?;
        tracing::info!("Server stopped");
        Ok(())
    }
}
