use anyhow::Result;
use init_tracing_opentelemetry::tracing_subscriber_ext::build_logger_text;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::TraceError;
use opentelemetry_sdk::trace::Tracer;
use tracing::{info, Subscriber};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan, Layer};
use tracing_subscriber::{registry, EnvFilter};

/// OTLP exporter layer, configured through the usual `OTEL_*` variables.
pub fn build_otel_layer<S>() -> Result<OpenTelemetryLayer<S, Tracer>, TraceError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    use init_tracing_opentelemetry::{init_propagator, otlp, resource::DetectResource};
    use opentelemetry::global;

    let otel_rsrc = DetectResource::default()
        .with_fallback_service_name(env!("CARGO_PKG_NAME"))
        .with_fallback_service_version(env!("CARGO_PKG_VERSION"))
        .build();
    let tracerprovider = otlp::traces::init_tracerprovider(otel_rsrc, otlp::traces::identity)
        .map_err(|e| TraceError::Other(Box::new(e)))?;
    init_propagator()?;
    let layer = tracing_opentelemetry::layer()
        .with_error_records_to_exceptions(true)
        .with_tracer(tracerprovider.tracer(""));
    global::set_tracer_provider(tracerprovider);
    Ok(layer)
}

pub fn build_reduced_logger_text<S>(debug: bool) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if debug || cfg!(debug_assertions) {
        Box::new(
            tracing_subscriber::fmt::layer()
                .with_line_number(false)
                .with_thread_names(false)
                .with_timer(tracing_subscriber::fmt::time::SystemTime)
                .with_target(true)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::NONE)
                .event_format(tracing_subscriber::fmt::format().compact()),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::SystemTime)
                .with_target(true),
        )
    }
}

/// `RUST_LOG` (or `OTEL_LOG_LEVEL`) plus the directives the otel layers need.
pub fn build_loglevel_filter_layer() -> EnvFilter {
    let base = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("OTEL_LOG_LEVEL"))
        .unwrap_or_else(|_| "info".to_string());
    // `otel::tracing` has to stay at trace level to emit spans.
    let directives =
        format!("{base},otel::tracing=trace,otel=debug,axum_tracing_opentelemetry=error");
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// True when the telemetry setting asks for trace export.
pub fn traces_enabled(telemetry: &Option<String>) -> bool {
    telemetry
        .as_ref()
        .map(|t| t.to_lowercase().split(',').any(|s| s.trim() == "traces"))
        .unwrap_or(false)
}

pub fn init_telemetry_and_tracing(telemetry: &Option<String>, debug: bool) -> Result<()> {
    // Temporary subscriber so setup itself is logged.
    let subscriber = registry()
        .with(build_loglevel_filter_layer())
        .with(build_logger_text());
    let _guard = tracing::subscriber::set_default(subscriber);
    info!("init logging & tracing");

    if traces_enabled(telemetry) {
        let subscriber = registry()
            .with(build_otel_layer()?)
            .with(build_loglevel_filter_layer())
            .with(build_reduced_logger_text(debug));
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = registry()
            .with(build_loglevel_filter_layer())
            .with(build_reduced_logger_text(debug));
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
