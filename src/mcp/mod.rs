//! Model Context Protocol server handling and JSON-RPC implementations
//!
//! JSON-RPC validation and routing, plus the session registry behind the SSE framing.

pub mod rpc;
pub mod server;
pub mod sse;
