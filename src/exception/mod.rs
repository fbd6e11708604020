use crate::error::BatonError;
use axum::response::Response;

mod json;

pub use json::JsonExceptionFilter;

/// Turns a dispatch error into the response sent to the client.
///
/// The kernel hands every error raised during routing, resolution or
/// controller invocation to its filter; there is no retry or fallback.
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, error: BatonError) -> Response;
}
