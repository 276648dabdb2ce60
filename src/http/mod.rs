//! HTTP surface of the server
//!
//! Public health probe, the `/mcp` and `/sse` transports, and the 404 fallback.

pub mod handlers;
