//! Market Stall Core - Shared types library.
//!
//! This crate provides the types used across all Market Stall components:
//! - `storefront` - Server-rendered storefront over the REST backend
//! - `cli` - Command-line tools for the session store
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no session
//! access, no HTTP clients. Every record mirrors a backend JSON payload.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, catalog/order/wallet/user records,
//!   the cart, response envelopes and the category pager

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
