//! Market Stall Storefront library.
//!
//! The storefront is a server-rendered web client for the Market Stall REST
//! backend. It is built as a library so the binary, the CLI and the
//! integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
