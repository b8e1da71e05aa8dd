//! Plinth Runtime - Example Server
//!
//! Hosts a small echo function to demonstrate the runtime end to end.

use plinth::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Example function: replies to events with an echo event, to everything
/// else with the request body.
struct EchoFunction;

#[async_trait]
impl PlinthFunction for EchoFunction {
    async fn init(&self) -> Result<(), PlinthError> {
        tracing::info!("Echo function initialized");
        Ok(())
    }

    async fn handle(&self, context: InvocationContext) -> Result<FunctionValue, PlinthError> {
        if let Some(event) = &context.event {
            let mut reply = Event::new("dev.plinth.echo", "/echo", event.id.clone());
            if let Some(content_type) = &event.datacontenttype {
                reply = reply.content_type(content_type.clone());
            }
            if let Some(data) = &event.data {
                reply = reply.data(data.clone());
            }
            return Ok(FunctionValue::Event(reply));
        }

        let body = context.request.text().unwrap_or_else(|| "hello".to_string());
        Ok(FunctionValue::text(body))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PlinthConfig::from_env();
    tracing::info!("Starting plinth on {}", config.bind_addr());

    let server = PlinthServer::new(config, Arc::new(EchoFunction));
    server.run().await
}
