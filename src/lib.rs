//! # Baton
//!
//! Controller resolution for axum-based HTTP kernels.
//!
//! A kernel asks a [`ControllerResolver`] two questions per request: which
//! controller handles it, and which arguments that controller gets. Baton
//! ships the contract, two strategies, and a small kernel driving them.
//!
//! ## Features
//!
//! - **Resolver contract**: [`ControllerResolver`] with `resolve_controller`
//!   and `resolve_arguments`
//! - **Explicit registration**: [`AttributeControllerResolver`] looks up the
//!   controller named by a request attribute
//! - **Table-driven**: [`RouteControllerResolver`] matches method and path
//!   against a [`RouteTable`]
//! - **Deterministic arguments**: request, path, query, body, service,
//!   default, null, in that order
//! - **Service injection**: controller arguments resolved by type from a
//!   [`Container`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use baton::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ControllerRegistry::new();
//!     registry.register(
//!         Controller::builder("users.show")
//!             .argument(ArgumentMetadata::integer("id"))
//!             .handler(handler_fn(|args: Arguments| async move {
//!                 Ok(format!("user #{}", args.int(0)?))
//!             }))
//!             .build()?,
//!     )?;
//!
//!     let mut routes = RouteTable::new();
//!     routes.get("/users/{id}", "users.show")?;
//!
//!     let resolver = RouteControllerResolver::new(
//!         Arc::new(routes),
//!         registry,
//!         ArgumentResolver::default(),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     HttpKernel::new(resolver).serve(listener).await?;
//!     Ok(())
//! }
//! ```

pub mod argument;
pub mod config;
pub mod controller;
pub mod di;
pub mod error;
pub mod exception;
pub mod kernel;
pub mod request;
pub mod resolver;
pub mod routing;

// Re-export core types
pub use argument::{ArgumentMetadata, ArgumentResolver, Arguments, Value};
pub use controller::{Controller, ControllerRegistry, handler_fn};
pub use di::{Container, ContainerBuilder};
pub use error::{ArgumentFailure, BatonError, NotFoundReason, Result};
pub use kernel::HttpKernel;
pub use request::Request;
pub use resolver::{AttributeControllerResolver, ControllerResolver, RouteControllerResolver};
pub use routing::RouteTable;

pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use baton::prelude::*;
/// ```
pub mod prelude {
    pub use crate::argument::{
        ArgumentKind, ArgumentMetadata, ArgumentResolver, ArgumentSource, Arguments, Value,
        ValueResolver,
    };
    pub use crate::config::{ConfigService, KernelConfig};
    pub use crate::controller::{Controller, ControllerRegistry, Handler, handler_fn};
    pub use crate::di::{Container, ContainerBuilder};
    pub use crate::error::{ArgumentFailure, BatonError, NotFoundReason, Result};
    pub use crate::exception::{ExceptionFilter, JsonExceptionFilter};
    pub use crate::kernel::{HttpKernel, KernelService, shutdown_signal};
    pub use crate::request::Request;
    pub use crate::resolver::{
        AttributeControllerResolver, ControllerResolver, RouteControllerResolver,
    };
    pub use crate::routing::RouteTable;
    pub use async_trait::async_trait;
    pub use axum::{
        Json,
        http::{Method, StatusCode},
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
