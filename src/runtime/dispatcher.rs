//! Invocation dispatch: init gate, context construction, response
//! classification.

use crate::event;
use crate::function::{FunctionValue, InvocationContext, PlinthError, PlinthFunction};
use crate::http::{PlinthRequest, PlinthResponse, StatusCode};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Default)]
enum GateState {
    #[default]
    Idle,
    Ready,
    Failed(String),
}

/// Once-only guard around the handler function's `init`.
///
/// The lock is held across the `init` call, which single-flights concurrent
/// first requests: one of them runs `init`, the rest block on the lock and
/// observe the latched outcome. A failed `init` latches too and is never
/// retried.
#[derive(Debug, Default)]
pub struct InitGate {
    state: Mutex<GateState>,
}

impl InitGate {
    /// Create a gate that has not yet run `init`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `init` has run to completion, running it if this is the first
    /// caller. Every call after a failed `init` returns the latched error.
    pub async fn ensure(&self, function: &dyn PlinthFunction) -> Result<(), PlinthError> {
        let mut state = self.state.lock().await;
        match &*state {
            GateState::Ready => Ok(()),
            GateState::Failed(message) => Err(PlinthError::new(message.clone())),
            GateState::Idle => {
                info!("Running function init()");
                match function.init().await {
                    Ok(()) => {
                        *state = GateState::Ready;
                        Ok(())
                    }
                    Err(err) => {
                        *state = GateState::Failed(err.message.clone());
                        Err(err)
                    }
                }
            }
        }
    }
}

/// Routes one request through the init gate, the handler function, and
/// response classification.
pub struct Dispatcher {
    gate: InitGate,
    function: Arc<dyn PlinthFunction>,
}

impl Dispatcher {
    /// Create a dispatcher owning a fresh gate for the given function.
    pub fn new(function: Arc<dyn PlinthFunction>) -> Self {
        Self {
            gate: InitGate::new(),
            function,
        }
    }

    /// Dispatch a single request.
    ///
    /// An `Err` means `init` failed; that is the one failure category allowed
    /// past this boundary. Handler failures are converted to a 500 response
    /// here, with the full detail logged for operators.
    pub async fn dispatch(&self, request: PlinthRequest) -> Result<PlinthResponse, PlinthError> {
        self.gate.ensure(self.function.as_ref()).await?;

        let context = InvocationContext::from_request(request);
        match self.function.handle(context).await {
            Ok(value) => Ok(classify(value)),
            Err(err) => {
                error!("Function invocation failed: {}", err);
                Ok(PlinthResponse::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Function raised {}", err),
                ))
            }
        }
    }
}

/// Map a handler return value onto the outgoing response.
fn classify(value: FunctionValue) -> PlinthResponse {
    match value {
        FunctionValue::Event(event) => {
            let (headers, body) = event::encode_binary(&event);
            let mut response = PlinthResponse::ok();
            for (name, value) in headers {
                response = response.header(name, value);
            }
            if let Some(body) = body {
                response = response.body(body);
            }
            response
        }
        FunctionValue::Http(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyInit {
        init_calls: AtomicUsize,
    }

    #[async_trait]
    impl PlinthFunction for FlakyInit {
        async fn init(&self) -> Result<(), PlinthError> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            Err(PlinthError::new("init exploded"))
        }

        async fn handle(
            &self,
            _context: InvocationContext,
        ) -> Result<FunctionValue, PlinthError> {
            Ok(FunctionValue::text("unreachable"))
        }
    }

    #[tokio::test]
    async fn failed_init_latches_without_retry() {
        let function = Arc::new(FlakyInit {
            init_calls: AtomicUsize::new(0),
        });
        let gate = InitGate::new();

        let first = gate.ensure(function.as_ref()).await;
        let second = gate.ensure(function.as_ref()).await;

        assert_eq!(first.unwrap_err().message, "init exploded");
        assert_eq!(second.unwrap_err().message, "init exploded");
        assert_eq!(function.init_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_value_classifies_to_binary_transport() {
        let event = Event::new("t", "s", "1").data("x");
        let response = classify(FunctionValue::Event(event));

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers.get("ce-id").map(String::as_str), Some("1"));
        assert_eq!(response.text_body().as_deref(), Some("x"));
    }

    #[test]
    fn http_value_passes_through_verbatim() {
        let inner = PlinthResponse::new(204u16).header("x-marker", "kept");
        let response = classify(FunctionValue::Http(inner));

        assert_eq!(response.status.0, 204);
        assert_eq!(
            response.headers.get("x-marker").map(String::as_str),
            Some("kept")
        );
    }
}
