//! HTTP gateway

pub mod proxy;
pub mod routes;
pub mod server;

pub use server::*;
