//! HTTP surface
//!
//! Generic admin CRUD handlers, the bridge proxy entry point, and the
//! shared response/auth plumbing they sit on.

pub mod admin;
pub mod bridge;
pub mod common;
pub mod middleware;
pub mod openapi;

pub use middleware::AppState;
