//! Observability infrastructure for Strata.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors for consistent
//! observability across all Strata components.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `strata_flow=debug`)
///
/// # Example
///
/// ```rust
/// use strata_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for catalog operations with standard fields.
///
/// # Example
///
/// ```rust
/// use strata_core::observability::catalog_span;
///
/// let span = catalog_span("upsert", "orders_cleaned", "prod");
/// let _guard = span.enter();
/// // ... do catalog operation
/// ```
#[must_use]
pub fn catalog_span(operation: &str, dataset: &str, environment: &str) -> Span {
    tracing::info_span!(
        "catalog",
        op = operation,
        dataset = dataset,
        environment = environment,
    )
}

/// Creates a span for pipeline operations.
///
/// # Example
///
/// ```rust
/// use strata_core::observability::pipeline_span;
///
/// let span = pipeline_span("run_job", "exec_01H", "prod");
/// let _guard = span.enter();
/// // ... do pipeline operation
/// ```
#[must_use]
pub fn pipeline_span(operation: &str, execution_id: &str, environment: &str) -> Span {
    tracing::info_span!(
        "pipeline",
        op = operation,
        execution_id = execution_id,
        environment = environment,
    )
}
