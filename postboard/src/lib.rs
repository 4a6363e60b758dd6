//! # postboard
//!
//! Minimal users-and-posts JSON API backed by a relational store.
//!
//! ## Architecture
//!
//! - **Store**: one pooled sea-orm connection, opened and verified at startup and closed on exit
//! - **HTTP**: Axum router over `/users` and `/posts`, with request IDs, tracing and graceful shutdown
//! - **Commands**: `serve` (default), `migrate` to create tables, `seed [--undo]` for development fixtures

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod http;
pub mod store;
