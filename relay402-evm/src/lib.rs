#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-3009 verification and relaying for x402 payment proofs.
//!
//! This crate takes a payment proof validated by `relay402` and carries it the
//! rest of the way: it rebuilds the EIP-712 typed data the payer signed,
//! recovers and checks the signer, picks a relayer account and submits
//! `transferWithAuthorization` on-chain.
//!
//! # Features
//!
//! - **ERC-3009 Payments**: Gasless token transfers using `transferWithAuthorization`
//! - **Relayer Pool**: Random or round-robin selection among operator accounts
//! - **Nonce Management**: Per-relayer nonce tracking with pending transaction awareness
//! - **Replay Pre-check**: Optional `authorizationState` query before submission
//!
//! # Architecture
//!
//! - [`chain`] - RPC client, provider stack and nonce management
//! - [`relayer`] - Relayer keys and selection strategies
//! - [`exact`] - The `exact` scheme: typed data, signatures, the asset contract
//!   and the [`RelayEngine`](exact::RelayEngine) pipeline
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans and events for each pipeline stage and RPC call
pub mod chain;
pub mod exact;
pub mod relayer;

mod networks;
pub use networks::*;
