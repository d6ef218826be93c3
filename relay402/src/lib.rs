#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for x402 payment proofs.
//!
//! This crate holds the chain-agnostic half of an x402 pay-per-request gateway:
//! everything that can be decided about a payment proof without talking to a
//! blockchain. Chain-specific verification and settlement live in
//! `relay402-evm`.
//!
//! # Overview
//!
//! A client that received an HTTP 402 challenge resubmits its request with a
//! payment proof in a header. The proof is a base64url-encoded JSON document
//! wrapping a signed EIP-3009 `transferWithAuthorization`. Processing it is a
//! strict pipeline; this crate provides the first stages:
//!
//! 1. [`encoding::decode_payment_header`] turns the header value into a
//!    [`proto::PaymentProofDocument`].
//! 2. [`validate::ProtocolValidator`] checks version, scheme, network and field
//!    presence, and yields a strictly typed [`proto::PaymentProof`].
//! 3. [`validate::assert_time`] enforces the authorization validity window.
//!
//! # Modules
//!
//! - [`encoding`] - Base64url proof header decoding
//! - [`networks`] - Registry of well-known networks by name
//! - [`proto`] - Wire format types, error taxonomy and challenge bodies
//! - [`timestamp`] - Unix timestamps
//! - [`validate`] - Protocol and temporal validators
//!
//! # Feature Flags
//!
//! - `telemetry` - Emits tracing events when a proof is rejected

pub mod encoding;
pub mod networks;
pub mod proto;
pub mod timestamp;
pub mod validate;
