use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;
use crate::request::{Operation, RequestId};

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level. JSON output carries the current
/// span and span list so workflow spans show up on every event.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    if config.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    }

    tracing::debug!("deee-certify telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the common workflow attributes
pub fn workflow_span(
    operation: Operation,
    request_id: Option<&RequestId>,
    correlation_id: &str,
) -> tracing::Span {
    let request_id = request_id.map(|id| id.to_string());
    tracing::info_span!(
        "certification_workflow",
        operation = operation.as_str(),
        request.id = request_id.as_deref(),
        correlation.id = correlation_id,
    )
}
