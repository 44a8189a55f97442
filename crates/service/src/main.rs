//! Demo entry point: runs one order through the configured strategy.

use std::sync::Arc;

use fulfillment::{FulfilmentEnv, IngredientCatalog, OrderData, TracingEventSink};
use service::{Config, FulfilmentService, Submission};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        strategy = %config.strategy,
        scenario = config.scenario.as_str(),
        base_delay_ms = config.base_delay_ms,
        "sandwich fulfilment demo starting"
    );

    // 2. Build the shared environment and the service
    let env = FulfilmentEnv::new(
        config.chaos(),
        IngredientCatalog::new(),
        Arc::new(TracingEventSink),
    );
    let service = FulfilmentService::with_strategy(env, config.strategy);

    // 3. Submit a sample order under the configured strategy
    let order = OrderData::new(
        "demo-order-1",
        "sourdough",
        vec!["turkey".to_string(), "cheese".to_string(), "lettuce".to_string()],
        vec!["mayo".to_string(), "mustard".to_string()],
    );

    let outcome = match service.submit(order).await {
        Ok(Submission::Completed(state)) => Ok(state),
        Ok(Submission::Started(handle)) => {
            tracing::info!(run_id = %handle.run_id(), "workflow running");
            handle.join().await.map_err(|error| error.to_string())
        }
        Err(error) => Err(error.to_string()),
    };

    match outcome {
        Ok(state) => {
            tracing::info!(
                order_id = %state.order_id(),
                completed = state.is_completed(),
                substitutions = state.substitutions().len(),
                "order finished"
            );
        }
        Err(error) => {
            tracing::error!(%error, "order failed");
            std::process::exit(1);
        }
    }
}
