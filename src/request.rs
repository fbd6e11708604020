use crate::error::{BatonError, Result};
use axum::{
    body::{Body, Bytes},
    extract::Query,
    http::{self, HeaderMap, Method, Uri, header},
};
use http_body_util::LengthLimitError;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Attribute key the routing stage stores the controller name under.
pub const CONTROLLER_ATTRIBUTE: &str = "_controller";

/// A fully buffered inbound request.
///
/// Resolvers only ever see `&Request`. Attributes are written by the routing
/// stage that runs before resolution (see [`crate::routing::RouteTable::apply`]).
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    query: Vec<(String, String)>,
    attributes: BTreeMap<String, String>,
    json: OnceLock<Option<serde_json::Value>>,
}

impl Request {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = match Query::<Vec<(String, String)>>::try_from_uri(&uri) {
            Ok(Query(pairs)) => pairs,
            Err(e) => {
                tracing::debug!("Ignoring malformed query string in {}: {}", uri, e);
                Vec::new()
            }
        };

        Self {
            method,
            uri,
            headers,
            body,
            query,
            attributes: BTreeMap::new(),
            json: OnceLock::new(),
        }
    }

    /// Shorthand for a body-less request, mostly useful in tests.
    pub fn get(uri: &str) -> Result<Self> {
        Self::builder(Method::GET, uri).build()
    }

    pub fn builder(method: Method, uri: &str) -> RequestBuilder {
        RequestBuilder {
            method,
            uri: uri.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Buffer an `http` request, rejecting bodies larger than `limit`.
    pub async fn from_http(request: http::Request<Body>, limit: usize) -> Result<Self> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
            tracing::debug!("Failed to buffer request body: {}", e);
            let inner = e.into_inner();
            if inner.downcast_ref::<LengthLimitError>().is_some() {
                BatonError::PayloadTooLarge { limit }
            } else {
                BatonError::BadRequest(format!("failed to read request body: {}", inner))
            }
        })?;
        Ok(Self::new(parts.method, parts.uri, parts.headers, body))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// First query value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every query value for `name`, in order of appearance.
    pub fn query_all(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// The body parsed as JSON, or `None` when the body is empty, not JSON,
    /// or declared with a non-JSON content type. Parsed at most once.
    pub fn json(&self) -> Option<&serde_json::Value> {
        self.json
            .get_or_init(|| {
                if self.body.is_empty() || !self.has_json_content_type() {
                    return None;
                }
                match serde_json::from_slice(&self.body) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::debug!("Request body is not valid JSON: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    fn has_json_content_type(&self) -> bool {
        match self.header(header::CONTENT_TYPE.as_str()) {
            Some(content_type) => content_type.contains("json"),
            None => true,
        }
    }
}

pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    pub fn header(mut self, name: &'static str, value: &str) -> Result<Self> {
        let value: http::HeaderValue = value
            .parse()
            .map_err(|_| BatonError::BadRequest(format!("invalid value for header {}", name)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn json(mut self, value: &serde_json::Value) -> Self {
        self.headers.insert(
            header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        self.body = Bytes::from(value.to_string());
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request> {
        let uri: Uri = self
            .uri
            .parse()
            .map_err(|_| BatonError::BadRequest(format!("invalid uri {}", self.uri)))?;
        Ok(Request::new(self.method, uri, self.headers, self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_values() {
        let request = Request::get("/search?tag=a&q=rust%20lang&tag=b").unwrap();
        assert_eq!(request.query("q"), Some("rust lang"));
        assert_eq!(request.query_all("tag"), vec!["a", "b"]);
        assert_eq!(request.query("missing"), None);
    }

    #[test]
    fn test_json_body() {
        let request = Request::builder(Method::POST, "/users")
            .json(&json!({ "name": "ada" }))
            .build()
            .unwrap();
        assert_eq!(request.json().unwrap()["name"], "ada");
    }

    #[test]
    fn test_non_json_content_type_is_ignored() {
        let request = Request::builder(Method::POST, "/users")
            .header("content-type", "text/plain")
            .unwrap()
            .body(r#"{"name":"ada"}"#)
            .build()
            .unwrap();
        assert!(request.json().is_none());
    }

    #[tokio::test]
    async fn test_from_http_enforces_limit() {
        let request = http::Request::builder()
            .uri("/upload")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();
        let err = Request::from_http(request, 16).await.unwrap_err();
        assert!(matches!(err, BatonError::PayloadTooLarge { limit: 16 }));
    }

    struct ResetBody;

    impl axum::body::HttpBody for ResetBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<std::result::Result<http_body::Frame<Bytes>, Self::Error>>> {
            std::task::Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))))
        }
    }

    #[tokio::test]
    async fn test_from_http_read_failure_is_bad_request() {
        let request = http::Request::builder()
            .uri("/upload")
            .body(Body::new(ResetBody))
            .unwrap();
        let err = Request::from_http(request, 16).await.unwrap_err();
        assert!(matches!(err, BatonError::BadRequest(_)));
    }
}
