//! Route table: method + path pattern to controller name.
//!
//! Routes are matched in registration order; the first route whose pattern
//! and method both match wins. `HEAD` falls back to `GET`.

mod pattern;

pub use pattern::PathPattern;

use crate::error::{NotFoundReason, Result};
use crate::request::Request;
use axum::http::Method;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    controller: String,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }
}

#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        method: Method,
        pattern: &str,
        controller: impl Into<String>,
    ) -> Result<&mut Self> {
        let route = Route {
            method,
            pattern: PathPattern::parse(pattern)?,
            controller: controller.into(),
        };
        tracing::debug!(
            "Route {} {} -> {}",
            route.method,
            route.pattern.as_str(),
            route.controller
        );
        self.routes.push(route);
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, controller: impl Into<String>) -> Result<&mut Self> {
        self.add(Method::GET, pattern, controller)
    }

    pub fn post(&mut self, pattern: &str, controller: impl Into<String>) -> Result<&mut Self> {
        self.add(Method::POST, pattern, controller)
    }

    pub fn put(&mut self, pattern: &str, controller: impl Into<String>) -> Result<&mut Self> {
        self.add(Method::PUT, pattern, controller)
    }

    pub fn patch(&mut self, pattern: &str, controller: impl Into<String>) -> Result<&mut Self> {
        self.add(Method::PATCH, pattern, controller)
    }

    pub fn delete(&mut self, pattern: &str, controller: impl Into<String>) -> Result<&mut Self> {
        self.add(Method::DELETE, pattern, controller)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn match_route(
        &self,
        method: &Method,
        path: &str,
    ) -> std::result::Result<RouteMatch<'_>, NotFoundReason> {
        let mut allowed: Vec<Method> = Vec::new();
        let mut head_fallback = None;

        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            if route.method == *method {
                return Ok(RouteMatch { route, params });
            }
            if method == Method::HEAD && route.method == Method::GET && head_fallback.is_none() {
                head_fallback = Some(RouteMatch { route, params });
                continue;
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }

        if let Some(fallback) = head_fallback {
            return Ok(fallback);
        }
        // HEAD is served by GET routes.
        if let Some(get) = allowed.iter().position(|m| *m == Method::GET) {
            if !allowed.contains(&Method::HEAD) {
                allowed.insert(get + 1, Method::HEAD);
            }
        }
        if allowed.is_empty() {
            Err(NotFoundReason::NoRoute {
                method: method.clone(),
                path: path.to_string(),
            })
        } else {
            Err(NotFoundReason::MethodNotAllowed {
                method: method.clone(),
                path: path.to_string(),
                allowed,
            })
        }
    }

    /// Routing stage: record the matched controller name under `attribute`
    /// and every path parameter as a request attribute.
    pub fn apply(
        &self,
        request: &mut Request,
        attribute: &str,
    ) -> std::result::Result<(), NotFoundReason> {
        let RouteMatch { route, params } = self.match_route(request.method(), request.path())?;
        request.set_attribute(attribute, route.controller());
        for (name, value) in params {
            request.set_attribute(name, value);
        }
        Ok(())
    }
}
