//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives transfer initiation.

mod handlers;
mod server;

pub use server::HttpServer;
