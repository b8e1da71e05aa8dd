//! # Plinth - Host HTTP Runtime for a Single Handler Function
//!
//! Plinth turns a user-supplied handler function into a network-reachable
//! service. It accepts inbound HTTP requests, optionally decodes a structured
//! event envelope from them, invokes the function exactly once per request
//! after a one-time initialization step, and translates the function's
//! return value (or failure) into an HTTP response.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PlinthServer (hyper)                    │
//! │   POST /            GET /            GET /health/*          │
//! └───────┬──────────────────┬──────────────────┬───────────────┘
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//! ┌──────────────────────────────────┐   constant "OK"
//! │            Dispatcher            │
//! │  InitGate → InvocationContext →  │
//! │  PlinthFunction::handle →        │
//! │  response classification         │
//! └──────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use plinth::prelude::*;
//! use std::sync::Arc;
//!
//! struct HelloFunction;
//!
//! #[async_trait]
//! impl PlinthFunction for HelloFunction {
//!     async fn init(&self) -> Result<(), PlinthError> {
//!         // One-time setup runs before the first request.
//!         Ok(())
//!     }
//!
//!     async fn handle(
//!         &self,
//!         context: InvocationContext,
//!     ) -> Result<FunctionValue, PlinthError> {
//!         match &context.event {
//!             Some(event) => Ok(FunctionValue::text(format!("got event {}", event.id))),
//!             None => Ok(FunctionValue::text("Hello from plinth!")),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let server = PlinthServer::with_defaults(Arc::new(HelloFunction));
//!     server.run().await
//! }
//! ```
//!
//! ## Invocation Lifecycle
//!
//! 1. **Init** (`init`): runs at most once per process, before the first
//!    invocation, however many requests race for it.
//! 2. **Handle** (`handle`): runs once per request with a fresh
//!    [`InvocationContext`]. A POST carrying a well-formed envelope gets the
//!    decoded [`Event`] attached; a malformed envelope is logged and ignored.
//! 3. **Respond**: a returned [`Event`] goes out in binary transport mode,
//!    any other value passes through verbatim, and a failure becomes a 500
//!    carrying the failure text.
//!
//! The liveness and readiness probes under `/health/` answer `200 OK`
//! without ever touching the function.

pub mod event;
pub mod function;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::event::Event;
    pub use crate::function::{FunctionValue, InvocationContext, PlinthError, PlinthFunction};
    pub use crate::http::{Method, PlinthRequest, PlinthResponse, StatusCode};
    pub use crate::runtime::{PlinthConfig, PlinthServer};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use event::Event;
pub use function::{FunctionValue, InvocationContext, PlinthError, PlinthFunction};
pub use http::{PlinthRequest, PlinthResponse};
pub use runtime::{Dispatcher, InitGate, PlinthConfig, PlinthServer};
