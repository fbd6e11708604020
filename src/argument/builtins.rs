use crate::argument::convert::{from_json, from_str};
use crate::argument::{ArgumentContext, ArgumentKind, ArgumentMetadata, ArgumentSource, Value, ValueResolver};
use crate::di::Container;
use crate::error::ArgumentFailure;
use std::sync::Arc;

type Resolved = Result<Option<Value>, ArgumentFailure>;

/// Request and service arguments only ever come from their own resolvers.
fn is_plain(argument: &ArgumentMetadata) -> bool {
    !matches!(argument.kind(), ArgumentKind::Request | ArgumentKind::Service(_))
}

fn convert_all<'a>(argument: &ArgumentMetadata, raw: impl IntoIterator<Item = &'a str>) -> Resolved {
    let items = raw
        .into_iter()
        .map(|item| from_str(argument.kind(), item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Value::List(items)))
}

/// Hands the request itself to `request` arguments.
#[derive(Default)]
pub struct RequestValueResolver;

impl ValueResolver for RequestValueResolver {
    fn source(&self) -> ArgumentSource {
        ArgumentSource::Request
    }

    fn resolve(&self, context: &ArgumentContext<'_>, argument: &ArgumentMetadata) -> Resolved {
        match argument.kind() {
            ArgumentKind::Request => Ok(Some(Value::Request(Box::new(context.request.clone())))),
            _ => Ok(None),
        }
    }
}

/// Path parameters of the matched route. A variadic argument splits a
/// catch-all parameter on `/`.
#[derive(Default)]
pub struct PathValueResolver;

impl ValueResolver for PathValueResolver {
    fn source(&self) -> ArgumentSource {
        ArgumentSource::Path
    }

    fn resolve(&self, context: &ArgumentContext<'_>, argument: &ArgumentMetadata) -> Resolved {
        if !is_plain(argument) {
            return Ok(None);
        }
        let Some(raw) = context.path_params.get(argument.name()) else {
            return Ok(None);
        };
        if argument.is_variadic() {
            return convert_all(argument, raw.split('/').filter(|s| !s.is_empty()));
        }
        from_str(argument.kind(), raw).map(Some)
    }
}

#[derive(Default)]
pub struct QueryValueResolver;

impl ValueResolver for QueryValueResolver {
    fn source(&self) -> ArgumentSource {
        ArgumentSource::Query
    }

    fn resolve(&self, context: &ArgumentContext<'_>, argument: &ArgumentMetadata) -> Resolved {
        if !is_plain(argument) {
            return Ok(None);
        }
        if argument.is_variadic() {
            let values = context.request.query_all(argument.name());
            if values.is_empty() {
                return Ok(None);
            }
            return convert_all(argument, values);
        }
        match context.request.query(argument.name()) {
            Some(raw) => from_str(argument.kind(), raw).map(Some),
            None => Ok(None),
        }
    }
}

/// Top-level fields of a JSON object body.
///
/// A `json` argument pinned to the body receives the whole document, and a
/// pinned `bytes` argument receives the raw body. An explicit `null` field
/// resolves to `Value::Null` so the null fallbacks apply, variadic or not.
#[derive(Default)]
pub struct BodyValueResolver;

impl ValueResolver for BodyValueResolver {
    fn source(&self) -> ArgumentSource {
        ArgumentSource::Body
    }

    fn resolve(&self, context: &ArgumentContext<'_>, argument: &ArgumentMetadata) -> Resolved {
        if !is_plain(argument) {
            return Ok(None);
        }
        let request = context.request;

        if argument.source() == Some(ArgumentSource::Body) {
            match argument.kind() {
                ArgumentKind::Bytes if !request.body().is_empty() => {
                    return Ok(Some(Value::Bytes(request.body().clone())));
                }
                ArgumentKind::Json => {
                    if let Some(document) = request.json() {
                        return Ok(Some(Value::Json(document.clone())));
                    }
                }
                _ => {}
            }
        }

        let Some(field) = request
            .json()
            .and_then(|document| document.as_object())
            .and_then(|object| object.get(argument.name()))
        else {
            return Ok(None);
        };

        if field.is_null() {
            return Ok(Some(Value::Null));
        }
        if argument.is_variadic() {
            let items = match field.as_array() {
                Some(items) => items
                    .iter()
                    .map(|item| from_json(argument.kind(), item))
                    .collect::<Result<Vec<_>, _>>()?,
                None => vec![from_json(argument.kind(), field)?],
            };
            return Ok(Some(Value::List(items)));
        }
        from_json(argument.kind(), field).map(Some)
    }
}

/// Request headers, matched case-insensitively. Only used for arguments that
/// pin `ArgumentSource::Header`.
#[derive(Default)]
pub struct HeaderValueResolver;

impl ValueResolver for HeaderValueResolver {
    fn source(&self) -> ArgumentSource {
        ArgumentSource::Header
    }

    fn implicit(&self) -> bool {
        false
    }

    fn resolve(&self, context: &ArgumentContext<'_>, argument: &ArgumentMetadata) -> Resolved {
        if !is_plain(argument) {
            return Ok(None);
        }
        let headers = context.request.headers();
        let name = argument.name().to_ascii_lowercase();
        let values: Vec<&str> = headers
            .get_all(name.as_str())
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        if values.is_empty() {
            return Ok(None);
        }
        if argument.is_variadic() {
            return convert_all(argument, values);
        }
        from_str(argument.kind(), values[0]).map(Some)
    }
}

/// Services looked up by type in the DI container.
pub struct ServiceValueResolver {
    container: Arc<Container>,
}

impl ServiceValueResolver {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }
}

impl ValueResolver for ServiceValueResolver {
    fn source(&self) -> ArgumentSource {
        ArgumentSource::Service
    }

    fn resolve(&self, _context: &ArgumentContext<'_>, argument: &ArgumentMetadata) -> Resolved {
        let ArgumentKind::Service(service) = argument.kind() else {
            return Ok(None);
        };
        match self.container.resolve_erased(service.id) {
            Some(instance) => Ok(Some(Value::Service(instance))),
            None => {
                tracing::debug!("No service registered for {}", service.name);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Arguments;
    use crate::controller::{Controller, handler_fn};
    use crate::request::Request;
    use axum::http::Method;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn noop() -> Controller {
        Controller::builder("noop")
            .handler(handler_fn(|_args: Arguments| async { Ok("") }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_body_whole_document() {
        let request = Request::builder(Method::POST, "/users")
            .json(&json!({ "name": "ada", "age": 36 }))
            .build()
            .unwrap();
        let controller = noop();
        let params = BTreeMap::new();
        let context = ArgumentContext {
            request: &request,
            controller: &controller,
            path_params: &params,
        };

        let whole = ArgumentMetadata::json("user").from_source(ArgumentSource::Body);
        assert_eq!(
            BodyValueResolver.resolve(&context, &whole).unwrap(),
            Some(Value::Json(json!({ "name": "ada", "age": 36 })))
        );

        let field = ArgumentMetadata::integer("age");
        assert_eq!(BodyValueResolver.resolve(&context, &field).unwrap(), Some(Value::Int(36)));
    }

    #[test]
    fn test_pinned_json_ignores_same_named_field() {
        let request = Request::builder(Method::POST, "/users")
            .json(&json!({ "user": "ada", "age": 36 }))
            .build()
            .unwrap();
        let controller = noop();
        let params = BTreeMap::new();
        let context = ArgumentContext {
            request: &request,
            controller: &controller,
            path_params: &params,
        };

        let whole = ArgumentMetadata::json("user").from_source(ArgumentSource::Body);
        assert_eq!(
            BodyValueResolver.resolve(&context, &whole).unwrap(),
            Some(Value::Json(json!({ "user": "ada", "age": 36 })))
        );
    }

    #[test]
    fn test_variadic_null_field_is_null() {
        let request = Request::builder(Method::POST, "/posts")
            .json(&json!({ "tags": null }))
            .build()
            .unwrap();
        let controller = noop();
        let params = BTreeMap::new();
        let context = ArgumentContext {
            request: &request,
            controller: &controller,
            path_params: &params,
        };

        let tags = ArgumentMetadata::string("tags").variadic();
        assert_eq!(BodyValueResolver.resolve(&context, &tags).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_catch_all_path_splits() {
        let request = Request::get("/files/a/b/c").unwrap();
        let controller = noop();
        let params = BTreeMap::from([("rest".to_string(), "a/b/c".to_string())]);
        let context = ArgumentContext {
            request: &request,
            controller: &controller,
            path_params: &params,
        };

        let parts = ArgumentMetadata::string("rest").variadic();
        assert_eq!(
            PathValueResolver.resolve(&context, &parts).unwrap(),
            Some(Value::List(vec![Value::from("a"), Value::from("b"), Value::from("c")]))
        );
    }
}
