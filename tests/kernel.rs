use axum::body::Body;
use axum::http::{Request as HttpRequest, header};
use baton::prelude::*;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {}!", name)
    }
}

#[derive(Deserialize)]
struct NewUser {
    name: String,
    age: u32,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn registry() -> ControllerRegistry {
    let registry = ControllerRegistry::new();
    registry
        .register(
            Controller::builder("users.show")
                .argument(ArgumentMetadata::integer("id"))
                .handler(handler_fn(|args: Arguments| async move {
                    Ok(Json(json!({ "id": args.int(0)? })))
                }))
                .build()
                .unwrap(),
        )
        .unwrap()
        .register(
            Controller::builder("users.create")
                .argument(ArgumentMetadata::json("user").from_source(ArgumentSource::Body))
                .handler(handler_fn(|args: Arguments| async move {
                    let user: NewUser = args.json(0)?;
                    Ok((StatusCode::CREATED, format!("{} ({})", user.name, user.age)))
                }))
                .build()
                .unwrap(),
        )
        .unwrap()
        .register(
            Controller::builder("greet")
                .argument(ArgumentMetadata::string("name"))
                .argument(ArgumentMetadata::service::<dyn Greeter>("greeter"))
                .handler(handler_fn(|args: Arguments| async move {
                    let greeter = args.service_trait::<dyn Greeter>(1)?;
                    Ok(greeter.greet(args.str(0)?))
                }))
                .build()
                .unwrap(),
        )
        .unwrap()
        .register(
            Controller::builder("search")
                .argument(ArgumentMetadata::integer("page").with_default(1))
                .argument(ArgumentMetadata::string("tag").variadic())
                .handler(handler_fn(|args: Arguments| async move {
                    let tags: Vec<String> = args
                        .list(1)?
                        .iter()
                        .filter_map(|tag| match tag {
                            Value::String(s) => Some(s.clone()),
                            _ => None,
                        })
                        .collect();
                    Ok(Json(json!({ "page": args.int(0)?, "tags": tags })))
                }))
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
}

fn routes() -> RouteTable {
    let mut routes = RouteTable::new();
    routes
        .get("/users/{id}", "users.show")
        .unwrap()
        .post("/users", "users.create")
        .unwrap()
        .get("/greet/{name}", "greet")
        .unwrap()
        .get("/search", "search")
        .unwrap();
    routes
}

fn arguments() -> ArgumentResolver {
    let container = ContainerBuilder::new()
        .register(EnglishGreeter)
        .bind::<dyn Greeter, EnglishGreeter, _>(|g| g as Arc<dyn Greeter>)
        .build();
    ArgumentResolver::new(Arc::new(container))
}

fn table_app() -> axum::Router {
    let resolver = RouteControllerResolver::new(Arc::new(routes()), registry(), arguments());
    HttpKernel::new(resolver)
        .with_config(KernelConfig {
            body_limit: 1024,
            ..KernelConfig::default()
        })
        .into_router()
        .layer(TraceLayer::new_for_http())
}

fn attribute_app() -> axum::Router {
    let resolver = AttributeControllerResolver::new(registry(), arguments());
    HttpKernel::new(resolver)
        .with_routes(Arc::new(routes()))
        .into_router()
}

async fn send(app: axum::Router, request: HttpRequest<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> HttpRequest<Body> {
    HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn path_parameter_reaches_controller() {
    init_tracing();
    for app in [table_app(), attribute_app()] {
        let (status, body) = send(app, get("/users/42")).await;
        assert_eq!(status, StatusCode::OK);
        let body: JsonValue = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "id": 42 }));
    }
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    init_tracing();
    for app in [table_app(), attribute_app()] {
        let (status, body) = send(app, get("/orders/1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: JsonValue = serde_json::from_str(&body).unwrap();
        assert_eq!(body["code"], "CONTROLLER_NOT_FOUND");
    }
}

#[tokio::test]
async fn bad_argument_is_bad_request() {
    init_tracing();
    let (status, body) = send(table_app(), get("/users/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: JsonValue = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "ARGUMENT_RESOLUTION_FAILED");
}

#[tokio::test]
async fn json_body_argument() {
    init_tracing();
    let request = HttpRequest::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"Ada","age":36}"#))
        .unwrap();

    let (status, body) = send(table_app(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, "Ada (36)");
}

#[tokio::test]
async fn missing_body_is_rejected() {
    init_tracing();
    let request = HttpRequest::builder()
        .method(Method::POST)
        .uri("/users")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(attribute_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    init_tracing();
    let request = HttpRequest::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(vec![b' '; 4096]))
        .unwrap();

    let (status, _) = send(table_app(), request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn trait_service_is_injected() {
    init_tracing();
    let (status, body) = send(table_app(), get("/greet/Grace")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello, Grace!");
}

#[tokio::test]
async fn defaults_and_variadic_query() {
    init_tracing();
    let (_, body) = send(table_app(), get("/search?tag=rust&tag=http")).await;
    let body: JsonValue = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "page": 1, "tags": ["rust", "http"] }));

    let (_, body) = send(table_app(), get("/search?page=3")).await;
    let body: JsonValue = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "page": 3, "tags": [] }));
}

#[tokio::test]
async fn wrong_method_lists_allowed_methods() {
    init_tracing();
    let request = HttpRequest::builder()
        .method(Method::DELETE)
        .uri("/users/1")
        .body(Body::empty())
        .unwrap();

    let response = table_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
}

#[tokio::test]
async fn head_uses_get_controller() {
    init_tracing();
    let request = HttpRequest::builder()
        .method(Method::HEAD)
        .uri("/users/7")
        .body(Body::empty())
        .unwrap();

    let response = attribute_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
