//! The HTTP server binding the dispatcher to its route table.

use crate::function::PlinthFunction;
use crate::http::{Method, PlinthRequest, PlinthResponse, StatusCode};
use crate::runtime::{Dispatcher, PlinthConfig};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// HTTP host runtime for a single handler function.
///
/// Exposes the function at `/` and the orchestration probes under
/// `/health/`. Each connection is served on its own task; the dispatcher
/// guarantees init-before-handle ordering across all of them.
pub struct PlinthServer {
    /// Server configuration.
    config: PlinthConfig,
    /// The dispatcher owning the hosted function and its init gate.
    dispatcher: Arc<Dispatcher>,
}

impl PlinthServer {
    /// Create a new server hosting the given function.
    pub fn new(config: PlinthConfig, function: Arc<dyn PlinthFunction>) -> Self {
        Self {
            config,
            dispatcher: Arc::new(Dispatcher::new(function)),
        }
    }

    /// Create a new server with default configuration.
    pub fn with_defaults(function: Arc<dyn PlinthFunction>) -> Self {
        Self::new(PlinthConfig::default(), function)
    }

    /// Bind to the configured address and start serving.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Plinth server listening on {}", listener.local_addr()?);

        let dispatcher = self.dispatcher.clone();
        let config = self.config.clone();

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let dispatcher = dispatcher.clone();
            let config = config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let dispatcher = dispatcher.clone();
                    let config = config.clone();
                    async move { handle_request(req, dispatcher, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Routing decision for an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// A liveness or readiness probe; answered without touching the function.
    Probe,
    /// An invocation of the hosted function.
    Invoke,
    NotFound,
    MethodNotAllowed,
}

fn route(method: &hyper::Method, path: &str) -> Route {
    if path == "/health/liveness" || path == "/health/readiness" {
        if method == &hyper::Method::GET {
            Route::Probe
        } else {
            Route::MethodNotAllowed
        }
    } else if path == "/" {
        if method == &hyper::Method::GET || method == &hyper::Method::POST {
            Route::Invoke
        } else {
            Route::MethodNotAllowed
        }
    } else {
        Route::NotFound
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    dispatcher: Arc<Dispatcher>,
    config: PlinthConfig,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    debug!("Handling request: {} {} from {}", method, path, remote_addr);

    match route(&method, &path) {
        Route::Probe => return Ok(build_response(PlinthResponse::text("OK"))),
        Route::NotFound => {
            return Ok(build_response(PlinthResponse::error(
                StatusCode::NOT_FOUND,
                "Not Found",
            )))
        }
        Route::MethodNotAllowed => {
            return Ok(build_response(PlinthResponse::error(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed",
            )))
        }
        Route::Invoke => {}
    }

    let request = match convert_request(req, &config).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to convert request: {}", e);
            return Ok(build_response(PlinthResponse::error(
                StatusCode::BAD_REQUEST,
                e.to_string(),
            )));
        }
    };

    match dispatcher.dispatch(request).await {
        Ok(response) => Ok(build_response(response)),
        Err(e) => {
            // Initialization failure, fatal to this request path.
            error!("Function init failed: {}", e);
            Ok(build_response(PlinthResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            )))
        }
    }
}

/// Convert a hyper Request to a PlinthRequest.
async fn convert_request(
    req: Request<Incoming>,
    config: &PlinthConfig,
) -> Result<PlinthRequest, Box<dyn std::error::Error + Send + Sync>> {
    let method = Method::from(req.method());
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(String::from);

    let mut headers = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let body_bytes = req.collect().await?.to_bytes();
    let body = if body_bytes.len() > config.max_body_size {
        return Err("Request body too large".into());
    } else if body_bytes.is_empty() {
        None
    } else {
        Some(body_bytes)
    };

    Ok(PlinthRequest {
        method,
        path,
        query,
        headers,
        body,
    })
}

/// Build a hyper Response from a PlinthResponse.
fn build_response(plinth_response: PlinthResponse) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(plinth_response.status.0).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            plinth_response.status.0
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);

    for (name, value) in plinth_response.headers {
        builder = builder.header(name, value);
    }

    let body = plinth_response.body.unwrap_or_default();
    builder.body(Full::new(body)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_route_without_function_involvement() {
        assert_eq!(route(&hyper::Method::GET, "/health/liveness"), Route::Probe);
        assert_eq!(route(&hyper::Method::GET, "/health/readiness"), Route::Probe);
    }

    #[test]
    fn root_routes_to_invoke_for_get_and_post() {
        assert_eq!(route(&hyper::Method::GET, "/"), Route::Invoke);
        assert_eq!(route(&hyper::Method::POST, "/"), Route::Invoke);
    }

    #[test]
    fn other_methods_on_root_are_rejected() {
        assert_eq!(route(&hyper::Method::PUT, "/"), Route::MethodNotAllowed);
        assert_eq!(route(&hyper::Method::DELETE, "/"), Route::MethodNotAllowed);
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(route(&hyper::Method::GET, "/nope"), Route::NotFound);
        assert_eq!(route(&hyper::Method::POST, "/health"), Route::NotFound);
    }

    #[test]
    fn build_response_preserves_status_and_headers() {
        let response = build_response(PlinthResponse::error(StatusCode::NOT_FOUND, "missing"));
        assert_eq!(response.status(), hyper::StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/plain"
        );
    }
}
