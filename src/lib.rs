//! Schoolgate - session refresh and admin route guard for the school website
//!
//! Sits in front of the website, keeps the hosted auth session alive on every
//! request and sends visitors without a session away from the admin area.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;

pub use config::Config;
pub use error::Error;
pub use guard::{GuardOutcome, RouteClass, RoutePolicy};
