//! Axum route handlers for the payment gateway.
//!
//! - `GET /` — the paid resource: 402 without a proof, relay with one
//! - `OPTIONS /` — empty 200
//! - any other method on `/`, `HEAD` included — 405
//! - `GET /health` — liveness probe

use std::sync::Arc;

use alloy_primitives::TxHash;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use relay402::proto::PaymentVerificationError;
use relay402_evm::exact::{Eip3009Asset, RelayEngine, Settlement};
use relay402_evm::relayer::RelayerPool;
use serde::Serialize;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::challenge::PaymentChallenge;
use crate::error::GatewayError;

/// Shared application state for the gateway.
#[derive(Debug)]
pub struct GatewayState<A, P> {
    engine: RelayEngine<A, P>,
    challenge: PaymentChallenge,
    payment_header: HeaderName,
}

impl<A, P> GatewayState<A, P> {
    /// Bundles the relay engine with the challenge served to unpaid requests.
    pub const fn new(
        engine: RelayEngine<A, P>,
        challenge: PaymentChallenge,
        payment_header: HeaderName,
    ) -> Self {
        Self {
            engine,
            challenge,
            payment_header,
        }
    }

    /// Returns the relay engine.
    pub const fn engine(&self) -> &RelayEngine<A, P> {
        &self.engine
    }
}

/// Body of a successful relay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Always `true`.
    pub ok: bool,
    /// Hash of the relay transaction.
    pub tx_hash: TxHash,
    /// Block that confirmed it.
    pub block_number: Option<u64>,
    /// Explorer link for the transaction.
    pub explorer: String,
}

impl From<Settlement> for RelayResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            ok: true,
            tx_hash: settlement.tx_hash,
            block_number: settlement.block_number,
            explorer: settlement.explorer,
        }
    }
}

/// `GET /` — Serves the 402 challenge, or verifies and relays the payment proof.
///
/// # Errors
///
/// Returns 400 if the proof is rejected and 500 if relaying failed.
pub async fn get_resource<A, P>(
    State(state): State<Arc<GatewayState<A, P>>>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, GatewayError>
where
    A: Eip3009Asset,
    P: RelayerPool,
{
    let Some(value) = headers
        .get(&state.payment_header)
        .filter(|value| !value.as_bytes().trim_ascii().is_empty())
    else {
        let request_url = request_url(&headers, &uri);
        let body = state.challenge.payment_required(&request_url);
        return Ok((StatusCode::PAYMENT_REQUIRED, Json(body)).into_response());
    };
    let proof = value.to_str().map_err(|_| {
        PaymentVerificationError::MalformedProof("header is not visible ASCII".to_owned())
    })?;

    let settlement = state.engine.relay(proof).await?;
    tracing::info!(
        tx_hash = %settlement.tx_hash,
        payer = %settlement.payer,
        relayer = %settlement.relayer,
        block = ?settlement.block_number,
        "Payment relayed"
    );
    Ok(Json(RelayResponse::from(settlement)).into_response())
}

/// `OPTIONS /` — Empty success for clients probing the resource.
pub async fn options_resource() -> StatusCode {
    StatusCode::OK
}

/// Any other method on `/`.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, OPTIONS")],
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

/// `GET /health` — Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Builds the gateway router with CORS and request tracing applied.
pub fn gateway_router<A, P>(state: Arc<GatewayState<A, P>>) -> Router
where
    A: Eip3009Asset + 'static,
    P: RelayerPool + 'static,
{
    Router::new()
        .route(
            "/",
            get(get_resource::<A, P>)
                .head(method_not_allowed)
                .options(options_resource)
                .fallback(method_not_allowed),
        )
        .route("/health", get(health))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(cors::Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Reconstructs the URL the client asked for, for the challenge `resource`.
fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}{}", uri.path())
}
