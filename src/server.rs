//! HTTP server for the protected resource
//!
//! Wires the payment gate in front of the resource route and adds the
//! surrounding surface: public client configuration, a health check, static
//! files for the payment UI, CORS and request tracing.

use crate::config::AppConfig;
use crate::facilitator::FacilitatorClient;
use crate::middleware::{PaymentContext, PaymentGate, PaymentGateLayer};
use crate::types::{headers, routes, Price};
use crate::{GateError, Result};
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Settings the browser payment UI may read
///
/// Never carries the facilitator secret.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub client_id: Option<String>,
    pub network: String,
    pub pay_to: String,
    pub price: Price,
}

impl From<&AppConfig> for PublicConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            network: config.descriptor.network.clone(),
            pay_to: config.descriptor.pay_to.clone(),
            price: config.descriptor.price.clone(),
        }
    }
}

type SharedConfig = Arc<PublicConfig>;

/// Build the application with the HTTP facilitator client
pub fn app(config: &AppConfig) -> Result<Router> {
    let facilitator = FacilitatorClient::new(config.facilitator.clone())?;
    let gate = PaymentGate::new(
        config.descriptor.clone(),
        Arc::new(facilitator),
        config.gate.clone(),
    )?;
    router(config, gate)
}

/// Build the application around an existing gate
///
/// Fails when the gate's resource path would shadow one of the server's own
/// routes.
pub fn router(config: &AppConfig, gate: PaymentGate) -> Result<Router> {
    let resource_path = gate.descriptor().resource_path.clone();
    if routes::RESERVED.contains(&resource_path.as_str()) {
        return Err(GateError::config(format!(
            "resource path '{resource_path}' is already served by the gate server"
        )));
    }
    let shared: SharedConfig = Arc::new(PublicConfig::from(config));

    let router = Router::new()
        .route(
            &resource_path,
            get(protected_resource)
                .post(protected_resource)
                .options(|| async { StatusCode::OK }),
        )
        .route_layer(PaymentGateLayer::new(gate))
        .route(routes::CONFIG, get(public_config))
        .route(routes::HEALTH, get(health))
        .with_state(shared)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http());
    Ok(router)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            headers::X_PAYMENT,
            header::AUTHORIZATION,
            headers::X_PAYMENT_MESSAGE,
        ])
        .expose_headers([
            headers::X_PAYMENT_RECEIPT,
            headers::X_PAYMENT_MESSAGE,
            headers::X_PAYMENT_RESPONSE,
        ])
}

async fn protected_resource(
    State(config): State<SharedConfig>,
    Extension(payment): Extension<PaymentContext>,
) -> Json<Value> {
    tracing::info!(request_id = %payment.request_id, "Serving paid resource");
    Json(json!({
        "message": "Access granted",
        "data": {
            "location": "Shanghai",
            "temp": "22°C",
            "condition": "Partly Cloudy",
        },
        "payment": {
            "requestId": payment.request_id,
            "resource": payment.resource_url,
            "customerId": payment.customer_id,
            "payer": payment.payer,
            "receipt": payment.receipt,
            "paidTo": config.pay_to,
        },
    }))
}

async fn public_config(State(config): State<SharedConfig>) -> Json<PublicConfig> {
    Json(config.as_ref().clone())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// Bind and serve until Ctrl-C or SIGTERM
pub async fn serve(config: AppConfig) -> Result<()> {
    let app = app(&config)?;
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    tracing::info!(
        address = %config.bind_address,
        resource = %config.descriptor.resource_url,
        mode = %config.gate.settlement_mode,
        "Payment gate listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Payment gate shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
