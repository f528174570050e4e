use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, Method, StatusCode,
};
use axum::{middleware, Router};
use axum_tracing_opentelemetry::middleware::{OtelAxumLayer, OtelInResponseLayer};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::middleware::https::redirect_to_https;
use crate::settings::config::Settings;
use crate::{api::router::ApiRoutes, app_state::SharedAppState};

/// The router with the transport-level layers every request passes first.
pub fn build_app(app_state: SharedAppState, telemetry_enabled: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderName::from_static("x-cache"),
            HeaderName::from_static("x-cache-age"),
        ]);

    let mut app = ApiRoutes::create(app_state.clone())
        .layer(request_timeout_layer(&app_state.settings))
        .layer(TraceLayer::new_for_http());

    if telemetry_enabled {
        app = app
            .layer(OtelInResponseLayer)
            .layer(OtelAxumLayer::default());
    }

    app.layer(middleware::from_fn_with_state(
        app_state.clone(),
        redirect_to_https,
    ))
    .layer(cors)
}

/// Answers 408 once `api.request_timeout` is spent.
pub fn request_timeout_layer(settings: &Settings) -> TimeoutLayer {
    TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        settings.api.request_timeout.as_duration(),
    )
}

pub async fn setup_http_server(
    app_state: SharedAppState,
    bind_address: &str,
    telemetry_enabled: bool,
) -> anyhow::Result<tokio::task::JoinHandle<anyhow::Result<()>>> {
    let app = build_app(app_state.clone(), telemetry_enabled);

    println!("🚀 API-Server starting at {}", &bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    let stop_flag = app_state.stop_flag.clone();
    let handle = tokio::spawn(async move {
        info!("Starting HTTP server");
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            stop_flag.wait().await;
            info!("Stop flag was set, shutting down HTTP server gracefully");
        })
        .await?;
        info!("HTTP server is down");
        Ok(())
    });

    Ok(handle)
}
