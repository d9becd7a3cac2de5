//! Session refresh and route protection

pub mod middleware;
pub mod routes;

pub use middleware::{evaluate, session_guard, GuardOutcome};
pub use routes::{RouteClass, RoutePolicy};
