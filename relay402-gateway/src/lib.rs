//! x402 payment gateway server.
//!
//! Serves a single paid resource. A request without a payment proof gets an
//! HTTP 402 challenge; a request carrying one is verified and relayed as an
//! EIP-3009 `transferWithAuthorization` by [`relay402_evm::exact::RelayEngine`].
//!
//! # Modules
//!
//! - [`config`] — Command line and environment configuration
//! - [`challenge`] — The HTTP 402 challenge body
//! - [`handlers`] — Axum route handlers and router builder
//! - [`error`] — Mapping of relay failures to HTTP responses
//! - [`telemetry`] — Tracing subscriber and optional OTLP export
//! - [`util`] — Shutdown signal handling

pub mod challenge;
pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;
pub mod util;

pub use handlers::{GatewayState, gateway_router};
