//! Calculator domain logic and its MCP tool bindings

pub mod calculator;
pub mod tools;
