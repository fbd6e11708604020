use crate::error::BatonError;
use crate::exception::ExceptionFilter;
use axum::{
    Json,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    code: &'static str,
    message: String,
    timestamp: String,
}

/// Renders errors as `{ statusCode, code, message, timestamp }`.
///
/// Server-side (5xx) messages are replaced with a generic text unless
/// `expose_errors` is set.
#[derive(Debug, Clone, Default)]
pub struct JsonExceptionFilter {
    expose_errors: bool,
}

impl JsonExceptionFilter {
    pub fn new(expose_errors: bool) -> Self {
        Self { expose_errors }
    }
}

impl ExceptionFilter for JsonExceptionFilter {
    fn catch(&self, error: BatonError) -> Response {
        let status = error.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", error);
        } else {
            tracing::warn!("Request rejected: {}", error);
        }

        let message = if status.is_server_error() && !self.expose_errors {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            error.to_string()
        };

        let allow = error.allowed_methods().map(|methods| {
            methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        });

        let body = ErrorBody {
            status_code: status.as_u16(),
            code: error.code(),
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = allow.and_then(|allow| HeaderValue::from_str(&allow).ok()) {
            response.headers_mut().insert(header::ALLOW, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotFoundReason;
    use axum::http::{Method, StatusCode};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_error_body() {
        let error = BatonError::not_found(NotFoundReason::NoRoute {
            method: Method::GET,
            path: "/nope".to_string(),
        });
        let response = JsonExceptionFilter::default().catch(error);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["code"], "CONTROLLER_NOT_FOUND");
        assert_eq!(body["message"], "Controller not found: no route matches GET /nope");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_server_error_masking() {
        let error = || BatonError::Internal("db password leaked".to_string());

        let masked = body_json(JsonExceptionFilter::new(false).catch(error())).await;
        assert_eq!(masked["message"], "Internal Server Error");

        let exposed = body_json(JsonExceptionFilter::new(true).catch(error())).await;
        assert_eq!(exposed["message"], "Internal error: db password leaked");
    }

    #[test]
    fn test_allow_header() {
        let error = BatonError::not_found(NotFoundReason::MethodNotAllowed {
            method: Method::PUT,
            path: "/users/1".to_string(),
            allowed: vec![Method::GET, Method::DELETE],
        });
        let response = JsonExceptionFilter::default().catch(error);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, DELETE");
    }
}
