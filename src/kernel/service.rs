use crate::kernel::HttpKernel;
use crate::resolver::ControllerResolver;
use axum::{body::Body, http::Request, response::Response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// The kernel as a `tower::Service`. Errors are already rendered into
/// responses, so the service itself never fails.
pub struct KernelService<R> {
    kernel: Arc<HttpKernel<R>>,
}

impl<R> KernelService<R> {
    pub(crate) fn new(kernel: Arc<HttpKernel<R>>) -> Self {
        Self { kernel }
    }
}

impl<R> Clone for KernelService<R> {
    fn clone(&self) -> Self {
        Self {
            kernel: Arc::clone(&self.kernel),
        }
    }
}

impl<R: ControllerResolver> Service<Request<Body>> for KernelService<R> {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let kernel = Arc::clone(&self.kernel);
        Box::pin(async move { Ok(kernel.handle_http(req).await) })
    }
}
